use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::order::OrderSide;

pub const MIN_LEVERAGE: u32 = 1;
pub const MAX_LEVERAGE: u32 = 125;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    /// Side of the market order that opens the position.
    pub fn entry_side(self) -> OrderSide {
        match self {
            Direction::Long => OrderSide::Buy,
            Direction::Short => OrderSide::Sell,
        }
    }

    /// Side of the order that closes the position.
    pub fn exit_side(self) -> OrderSide {
        self.entry_side().opposite()
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Long => write!(f, "LONG"),
            Direction::Short => write!(f, "SHORT"),
        }
    }
}

/// The signal fields that take part in validation. Also used by the grammar
/// to name missing or malformed labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalField {
    Entry,
    TakeProfit,
    StopLoss,
    Leverage,
    Margin,
}

impl fmt::Display for SignalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SignalField::Entry => "Entry",
            SignalField::TakeProfit => "TP",
            SignalField::StopLoss => "SL",
            SignalField::Leverage => "Leverage",
            SignalField::Margin => "Margin",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidSignal {
    #[error("symbol must be a non-empty uppercase alphabetic ticker, got {0:?}")]
    BadSymbol(String),
    #[error("{field} must be positive, got {value}")]
    NonPositive { field: SignalField, value: Decimal },
    #[error("leverage {0}x outside {MIN_LEVERAGE}..={MAX_LEVERAGE}")]
    LeverageOutOfRange(i64),
    #[error("LONG take profit {take_profit} must be above entry {entry}")]
    LongTakeProfitNotAboveEntry { entry: Decimal, take_profit: Decimal },
    #[error("SHORT take profit {take_profit} must be below entry {entry}")]
    ShortTakeProfitNotBelowEntry { entry: Decimal, take_profit: Decimal },
}

/// Raw field values as pulled out of a message, before any rule is checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalDraft {
    pub direction: Direction,
    pub symbol: String,
    pub entry: Decimal,
    pub take_profit: Decimal,
    pub stop_loss: Option<Decimal>,
    /// Signed and wide so that any number written in a message can be range-checked.
    pub leverage: i64,
    pub margin: Decimal,
}

/// A validated trade intent. Only obtainable through [`Signal::try_from_draft`],
/// so every instance satisfies the direction, range and positivity rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Signal {
    direction: Direction,
    symbol: String,
    entry: Decimal,
    take_profit: Decimal,
    stop_loss: Option<Decimal>,
    leverage: u32,
    margin: Decimal,
}

impl Signal {
    pub fn try_from_draft(draft: SignalDraft) -> Result<Self, InvalidSignal> {
        let SignalDraft {
            direction,
            symbol,
            entry,
            take_profit,
            stop_loss,
            leverage,
            margin,
        } = draft;

        if symbol.is_empty() || !symbol.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(InvalidSignal::BadSymbol(symbol));
        }

        for (field, value) in [
            (SignalField::Entry, entry),
            (SignalField::TakeProfit, take_profit),
            (SignalField::Margin, margin),
        ] {
            if value <= Decimal::ZERO {
                return Err(InvalidSignal::NonPositive { field, value });
            }
        }

        let leverage = match u32::try_from(leverage) {
            Ok(l) if (MIN_LEVERAGE..=MAX_LEVERAGE).contains(&l) => l,
            _ => return Err(InvalidSignal::LeverageOutOfRange(leverage)),
        };

        match direction {
            Direction::Long if take_profit <= entry => {
                return Err(InvalidSignal::LongTakeProfitNotAboveEntry { entry, take_profit });
            }
            Direction::Short if take_profit >= entry => {
                return Err(InvalidSignal::ShortTakeProfitNotBelowEntry { entry, take_profit });
            }
            _ => {}
        }

        Ok(Self {
            direction,
            symbol,
            entry,
            take_profit,
            stop_loss,
            leverage,
            margin,
        })
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn entry(&self) -> Decimal {
        self.entry
    }

    pub fn take_profit(&self) -> Decimal {
        self.take_profit
    }

    /// Parsed when present, never acted upon.
    pub fn stop_loss(&self) -> Option<Decimal> {
        self.stop_loss
    }

    pub fn leverage(&self) -> u32 {
        self.leverage
    }

    pub fn margin(&self) -> Decimal {
        self.margin
    }

    /// Position notional before sizing: margin times leverage.
    pub fn notional(&self) -> Decimal {
        self.margin * Decimal::from(self.leverage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn draft() -> SignalDraft {
        SignalDraft {
            direction: Direction::Long,
            symbol: "BTCUSDT".to_string(),
            entry: dec!(60000),
            take_profit: dec!(62000),
            stop_loss: None,
            leverage: 10,
            margin: dec!(50),
        }
    }

    #[test]
    fn test_valid_long_is_accepted() {
        let signal = Signal::try_from_draft(draft()).unwrap();
        assert_eq!(signal.direction(), Direction::Long);
        assert_eq!(signal.notional(), dec!(500));
    }

    #[test]
    fn test_long_take_profit_must_be_above_entry() {
        let mut d = draft();
        d.take_profit = dec!(60000);
        assert_eq!(
            Signal::try_from_draft(d),
            Err(InvalidSignal::LongTakeProfitNotAboveEntry {
                entry: dec!(60000),
                take_profit: dec!(60000)
            })
        );
    }

    #[test]
    fn test_short_take_profit_must_be_below_entry() {
        let mut d = draft();
        d.direction = Direction::Short;
        assert!(matches!(
            Signal::try_from_draft(d),
            Err(InvalidSignal::ShortTakeProfitNotBelowEntry { .. })
        ));
    }

    #[test]
    fn test_leverage_bounds() {
        let beyond_u32 = i64::from(u32::MAX) + 1;
        for (leverage, ok) in [
            (-5, false),
            (0, false),
            (1, true),
            (125, true),
            (126, false),
            (beyond_u32, false),
        ] {
            let mut d = draft();
            d.leverage = leverage;
            assert_eq!(Signal::try_from_draft(d).is_ok(), ok, "leverage {}", leverage);
        }

        let mut d = draft();
        d.leverage = beyond_u32;
        assert_eq!(
            Signal::try_from_draft(d),
            Err(InvalidSignal::LeverageOutOfRange(beyond_u32))
        );
    }

    #[test]
    fn test_non_positive_margin_names_the_field() {
        let mut d = draft();
        d.margin = dec!(0);
        assert_eq!(
            Signal::try_from_draft(d),
            Err(InvalidSignal::NonPositive {
                field: SignalField::Margin,
                value: dec!(0)
            })
        );
    }

    #[test]
    fn test_direction_sides() {
        assert_eq!(Direction::Long.entry_side(), OrderSide::Buy);
        assert_eq!(Direction::Long.exit_side(), OrderSide::Sell);
        assert_eq!(Direction::Short.entry_side(), OrderSide::Sell);
        assert_eq!(Direction::Short.exit_side(), OrderSide::Buy);
    }
}
