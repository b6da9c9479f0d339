use rust_decimal::Decimal;
use serde::Deserialize;

use crate::{error::GatewayError, traits::RemoteResponse};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountBalance {
    pub available: Decimal,
    pub wallet: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct FuturesAccountResponse {
    #[serde(rename(deserialize = "availableBalance"))]
    pub available_balance: String,
    #[serde(rename(deserialize = "totalWalletBalance"))]
    pub total_wallet_balance: String,
}

impl RemoteResponse<AccountBalance> for FuturesAccountResponse {
    fn to_domain(&self) -> Result<AccountBalance, GatewayError> {
        Ok(AccountBalance {
            available: self.parse_decimal("availableBalance", &self.available_balance)?,
            wallet: self.parse_decimal("totalWalletBalance", &self.total_wallet_balance)?,
        })
    }
}
