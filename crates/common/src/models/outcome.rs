use std::fmt;

use rust_decimal::Decimal;
use serde::Serialize;

use super::order::{OpenPosition, OrderSide};
use super::signal::Direction;

/// The states of a single trade execution, in the order they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ExecutionStage {
    OpenPositionGate,
    MarginLimitGate,
    BalanceGate,
    ConfigureMargin,
    ConfigureLeverage,
    SizeQuantity,
    PlaceEntry,
    PlaceTakeProfit,
}

impl fmt::Display for ExecutionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExecutionStage::OpenPositionGate => "open-position check",
            ExecutionStage::MarginLimitGate => "margin limit check",
            ExecutionStage::BalanceGate => "balance check",
            ExecutionStage::ConfigureMargin => "isolated margin setup",
            ExecutionStage::ConfigureLeverage => "leverage setup",
            ExecutionStage::SizeQuantity => "position sizing",
            ExecutionStage::PlaceEntry => "entry order",
            ExecutionStage::PlaceTakeProfit => "take-profit order",
        };
        f.write_str(name)
    }
}

/// Policy gates. Nothing on the exchange has been changed when one of these fires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum BlockReason {
    ExecutionInFlight,
    OpenPositions(Vec<OpenPosition>),
    MarginLimitExceeded { margin: Decimal, limit: Decimal },
    InsufficientBalance { available: Decimal, required: Decimal },
}

impl fmt::Display for BlockReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockReason::ExecutionInFlight => write!(f, "another signal is being executed"),
            BlockReason::OpenPositions(positions) => {
                let list: Vec<String> = positions.iter().map(|p| p.to_string()).collect();
                write!(f, "open position(s) exist: {}", list.join(", "))
            }
            BlockReason::MarginLimitExceeded { margin, limit } => {
                write!(f, "margin ${} exceeds safety limit ${}", margin, limit)
            }
            BlockReason::InsufficientBalance {
                available,
                required,
            } => write!(
                f,
                "insufficient balance: ${} available, ${} required",
                available, required
            ),
        }
    }
}

/// Safe aborts: the step failed before any position was opened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum RejectReason {
    /// A read-only gate query failed or timed out.
    Unavailable { stage: ExecutionStage, detail: String },
    /// Margin mode, leverage or sizing failed.
    Configuration { stage: ExecutionStage, detail: String },
    /// The market entry failed. `uncertain` is set when the request may still have
    /// reached the exchange (connection lost or timed out).
    Entry { detail: String, uncertain: bool },
}

impl RejectReason {
    pub fn stage(&self) -> ExecutionStage {
        match self {
            RejectReason::Unavailable { stage, .. } | RejectReason::Configuration { stage, .. } => {
                *stage
            }
            RejectReason::Entry { .. } => ExecutionStage::PlaceEntry,
        }
    }

    pub fn is_uncertain(&self) -> bool {
        matches!(self, RejectReason::Entry { uncertain: true, .. })
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::Unavailable { stage, detail } => {
                write!(f, "{} unavailable: {}", stage, detail)
            }
            RejectReason::Configuration { stage, detail } => {
                write!(f, "{} failed: {}", stage, detail)
            }
            RejectReason::Entry {
                detail,
                uncertain: false,
            } => write!(f, "entry order rejected: {}", detail),
            RejectReason::Entry {
                detail,
                uncertain: true,
            } => write!(f, "entry order outcome unknown: {}", detail),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionReport {
    pub symbol: String,
    pub direction: Direction,
    pub entry_side: OrderSide,
    pub quantity: Decimal,
    pub entry_price: Decimal,
    pub take_profit: Decimal,
    pub leverage: u32,
    pub margin: Decimal,
    pub entry_order_id: u64,
    pub take_profit_order_id: u64,
    /// Stop loss carried by the signal. Never placed on the exchange.
    pub ignored_stop_loss: Option<Decimal>,
}

impl ExecutionReport {
    /// Always true: no stop-loss order is ever sent.
    pub fn unprotected_by_stop_loss(&self) -> bool {
        true
    }
}

/// Entry filled, take-profit missing. The account holds a live position
/// with no automated exit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartialFailure {
    pub symbol: String,
    pub position_side: OrderSide,
    pub quantity: Decimal,
    pub entry_order_id: u64,
    pub intended_take_profit: Decimal,
    pub detail: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ExecutionOutcome {
    Success(ExecutionReport),
    Rejected(RejectReason),
    Blocked(BlockReason),
    PartialFailure(PartialFailure),
}

impl ExecutionOutcome {
    /// True when the account holds a new position after this execution.
    pub fn is_position_opened(&self) -> bool {
        matches!(
            self,
            ExecutionOutcome::Success(_) | ExecutionOutcome::PartialFailure(_)
        )
    }

    pub fn is_partial_failure(&self) -> bool {
        matches!(self, ExecutionOutcome::PartialFailure(_))
    }
}

impl fmt::Display for ExecutionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionOutcome::Success(report) => {
                writeln!(f, "✅ Trade executed successfully!")?;
                writeln!(f, "{} {}", report.direction, report.symbol)?;
                writeln!(
                    f,
                    "Entry: {}, TP: {}",
                    report.entry_price, report.take_profit
                )?;
                writeln!(
                    f,
                    "{} {} @ {}x, margin ${}",
                    report.entry_side, report.quantity, report.leverage, report.margin
                )?;
                write!(f, "⚠️ NO STOP LOSS - Manage risk manually")
            }
            ExecutionOutcome::Rejected(reason) if reason.is_uncertain() => {
                writeln!(f, "⚠️ Entry status unknown: {}", reason)?;
                write!(f, "Check open positions on the exchange before acting.")
            }
            ExecutionOutcome::Rejected(reason) => write!(f, "❌ Trade not opened: {}", reason),
            ExecutionOutcome::Blocked(reason) => write!(f, "⛔ Trade blocked: {}", reason),
            ExecutionOutcome::PartialFailure(p) => {
                writeln!(f, "🚨 UNPROTECTED POSITION OPEN 🚨")?;
                writeln!(
                    f,
                    "Entry order {} filled: {} {} {}",
                    p.entry_order_id, p.position_side, p.quantity, p.symbol
                )?;
                writeln!(
                    f,
                    "Take profit at {} was NOT placed: {}",
                    p.intended_take_profit, p.detail
                )?;
                write!(f, "Close or protect this position manually NOW.")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn partial() -> ExecutionOutcome {
        ExecutionOutcome::PartialFailure(PartialFailure {
            symbol: "BTCUSDT".to_string(),
            position_side: OrderSide::Buy,
            quantity: dec!(0.008),
            entry_order_id: 42,
            intended_take_profit: dec!(62000),
            detail: "connection reset".to_string(),
        })
    }

    #[test]
    fn test_partial_failure_is_worded_apart_from_rejections() {
        let text = partial().to_string();
        assert!(text.contains("UNPROTECTED POSITION"));
        assert!(text.contains("BUY 0.008 BTCUSDT"));

        let rejected = ExecutionOutcome::Rejected(RejectReason::Entry {
            detail: "insufficient margin".to_string(),
            uncertain: false,
        })
        .to_string();
        assert!(!rejected.contains("UNPROTECTED"));
        assert!(rejected.contains("Trade not opened"));
    }

    #[test]
    fn test_uncertain_entry_does_not_claim_nothing_opened() {
        let reason = RejectReason::Entry {
            detail: "request timed out".to_string(),
            uncertain: true,
        };
        assert!(reason.is_uncertain());
        assert_eq!(reason.stage(), ExecutionStage::PlaceEntry);

        let text = ExecutionOutcome::Rejected(reason).to_string();
        assert!(text.contains("Entry status unknown"));
        assert!(text.contains("Check open positions"));
        assert!(!text.contains("Trade not opened"));
    }

    #[test]
    fn test_position_opened_only_for_success_and_partial() {
        assert!(partial().is_position_opened());
        assert!(partial().is_partial_failure());
        let blocked = ExecutionOutcome::Blocked(BlockReason::ExecutionInFlight);
        assert!(!blocked.is_position_opened());
    }

    #[test]
    fn test_reject_reason_reports_its_stage() {
        let reason = RejectReason::Configuration {
            stage: ExecutionStage::ConfigureLeverage,
            detail: "-4028".to_string(),
        };
        assert_eq!(reason.stage(), ExecutionStage::ConfigureLeverage);
        assert_eq!(
            RejectReason::Entry {
                detail: String::new(),
                uncertain: false,
            }
            .stage(),
            ExecutionStage::PlaceEntry
        );
    }
}
