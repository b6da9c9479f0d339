pub mod order;
pub mod outcome;
pub mod signal;

pub use order::{OpenPosition, OrderAck, OrderSide};
pub use outcome::{
    BlockReason, ExecutionOutcome, ExecutionReport, ExecutionStage, PartialFailure, RejectReason,
};
pub use signal::{Direction, InvalidSignal, Signal, SignalDraft, SignalField};
