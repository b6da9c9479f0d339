use common::models::OrderAck;
use serde::Deserialize;

use crate::{error::GatewayError, traits::RemoteResponse};

#[derive(Debug, Deserialize)]
pub struct OrderResponse {
    #[serde(rename(deserialize = "orderId"))]
    pub order_id: u64,
    pub symbol: String,
    pub status: String,
}

impl RemoteResponse<OrderAck> for OrderResponse {
    fn to_domain(&self) -> Result<OrderAck, GatewayError> {
        Ok(OrderAck {
            order_id: self.order_id,
            symbol: self.symbol.clone(),
            status: self.status.clone(),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct LeverageResponse {
    pub leverage: u32,
    pub symbol: String,
}
