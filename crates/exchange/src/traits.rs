use std::str::FromStr;

use async_trait::async_trait;
use common::models::{OpenPosition, OrderAck, OrderSide};
use rust_decimal::Decimal;

use crate::error::GatewayError;

/// Wire payloads that convert into a domain value.
pub trait RemoteResponse<T> {
    fn to_domain(&self) -> Result<T, GatewayError>;

    fn parse_decimal(&self, field: &str, raw: &str) -> Result<Decimal, GatewayError> {
        Decimal::from_str(raw)
            .map_err(|e| GatewayError::Decode(format!("{} {:?}: {}", field, raw, e)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarginTypeStatus {
    Changed,
    /// The symbol was already in isolated mode. Equivalent to `Changed`.
    AlreadySet,
}

/// Everything the trade executor needs from an exchange account.
#[async_trait]
pub trait ExchangeGateway: Send + Sync {
    async fn available_balance(&self) -> Result<Decimal, GatewayError>;

    /// Position rows for the whole account. Rows with zero quantity are not open.
    async fn open_positions(&self) -> Result<Vec<OpenPosition>, GatewayError>;

    async fn set_isolated_margin(&self, symbol: &str) -> Result<MarginTypeStatus, GatewayError>;

    async fn set_leverage(&self, symbol: &str, leverage: u32) -> Result<(), GatewayError>;

    /// `None` when the exchange publishes no lot-size step for `symbol`.
    async fn lot_step_size(&self, symbol: &str) -> Result<Option<Decimal>, GatewayError>;

    async fn place_market_order(
        &self,
        symbol: &str,
        side: OrderSide,
        quantity: Decimal,
    ) -> Result<OrderAck, GatewayError>;

    /// Conditional order that closes the whole position once `trigger_price` is reached.
    async fn place_take_profit_order(
        &self,
        symbol: &str,
        side: OrderSide,
        quantity: Decimal,
        trigger_price: Decimal,
    ) -> Result<OrderAck, GatewayError>;
}
