use common::models::{InvalidSignal, SignalField};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignalError {
    /// No LONG/SHORT marker bound to a symbol. Ordinary chat, not an error.
    #[error("no signal marker in message")]
    NotASignal,
    #[error("incomplete signal, missing {}", join_fields(.missing))]
    Incomplete {
        missing: Vec<SignalField>,
        excerpt: String,
    },
    #[error("malformed {field} value {raw:?}")]
    Malformed { field: SignalField, raw: String },
    #[error("invalid signal: {0}")]
    Invalid(#[from] InvalidSignal),
}

impl SignalError {
    /// Whether the message should be treated as ordinary chatter and skipped quietly.
    pub fn is_silent(&self) -> bool {
        matches!(self, SignalError::NotASignal)
    }
}

fn join_fields(fields: &[SignalField]) -> String {
    fields
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
