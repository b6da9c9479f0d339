use exchange::{ExchangeGateway, GatewayError};
use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SizingError {
    #[error("no lot-size metadata for {0}")]
    UnknownSymbol(String),
    #[error("lot step {0} is not positive")]
    InvalidStep(Decimal),
    #[error("entry price {0} is not positive")]
    InvalidEntry(Decimal),
    #[error("position size overflows")]
    Overflow,
    #[error("quantity {raw} is smaller than lot step {step}")]
    BelowStep { raw: Decimal, step: Decimal },
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Number of fractional digits a lot step allows: 0.001 -> 3, 1 -> 0.
pub fn step_precision(step: Decimal) -> u32 {
    step.normalize().scale()
}

/// Converts margin and leverage into an order quantity the exchange will accept.
pub struct PositionSizer;

impl PositionSizer {
    /// `margin * leverage / entry`, cut to the step's precision. Truncation never
    /// rounds up, so the order notional stays at or below what was asked for.
    pub fn quantity(
        step: Decimal,
        margin: Decimal,
        leverage: u32,
        entry: Decimal,
    ) -> Result<Decimal, SizingError> {
        if step <= Decimal::ZERO {
            return Err(SizingError::InvalidStep(step));
        }
        if entry <= Decimal::ZERO {
            return Err(SizingError::InvalidEntry(entry));
        }

        let notional = margin
            .checked_mul(Decimal::from(leverage))
            .ok_or(SizingError::Overflow)?;
        let raw = notional.checked_div(entry).ok_or(SizingError::Overflow)?;

        let precision = step_precision(step);
        let mut quantity = raw.round_dp_with_strategy(precision, RoundingStrategy::ToZero);
        quantity.rescale(precision);

        if quantity.is_zero() {
            return Err(SizingError::BelowStep { raw, step });
        }
        Ok(quantity)
    }

    pub async fn size<G: ExchangeGateway + ?Sized>(
        gateway: &G,
        symbol: &str,
        margin: Decimal,
        leverage: u32,
        entry: Decimal,
    ) -> Result<Decimal, SizingError> {
        let step = gateway
            .lot_step_size(symbol)
            .await?
            .ok_or_else(|| SizingError::UnknownSymbol(symbol.to_string()))?;

        let quantity = Self::quantity(step, margin, leverage, entry)?;
        info!(
            "Calculated quantity: {} {} (position size ${}: margin ${} x {}x)",
            quantity,
            symbol,
            margin * Decimal::from(leverage),
            margin,
            leverage
        );
        Ok(quantity)
    }
}
