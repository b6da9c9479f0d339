use common::models::OpenPosition;
use serde::Deserialize;

use crate::{error::GatewayError, traits::RemoteResponse};

#[derive(Debug, Deserialize)]
pub struct PositionRiskResponse {
    pub symbol: String,
    #[serde(rename(deserialize = "positionAmt"))]
    pub position_amt: String,
}

impl RemoteResponse<OpenPosition> for PositionRiskResponse {
    fn to_domain(&self) -> Result<OpenPosition, GatewayError> {
        Ok(OpenPosition {
            symbol: self.symbol.clone(),
            quantity: self.parse_decimal("positionAmt", &self.position_amt)?,
        })
    }
}
