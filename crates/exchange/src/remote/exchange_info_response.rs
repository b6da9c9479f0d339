use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::{error::GatewayError, traits::RemoteResponse};

const LOT_SIZE_FILTER: &str = "LOT_SIZE";

#[derive(Debug, Deserialize)]
pub struct ExchangeInfoResponse {
    pub symbols: Vec<SymbolInfo>,
}

#[derive(Debug, Deserialize)]
pub struct SymbolInfo {
    pub symbol: String,
    pub filters: Vec<SymbolFilter>,
}

#[derive(Debug, Deserialize)]
pub struct SymbolFilter {
    #[serde(rename(deserialize = "filterType"))]
    pub filter_type: String,
    #[serde(rename(deserialize = "stepSize"))]
    pub step_size: Option<String>,
}

/// symbol -> LOT_SIZE step. Symbols without the filter are left out.
impl RemoteResponse<HashMap<String, Decimal>> for ExchangeInfoResponse {
    fn to_domain(&self) -> Result<HashMap<String, Decimal>, GatewayError> {
        let mut steps = HashMap::with_capacity(self.symbols.len());
        for info in &self.symbols {
            let lot_size = info
                .filters
                .iter()
                .find(|f| f.filter_type == LOT_SIZE_FILTER)
                .and_then(|f| f.step_size.as_deref());

            if let Some(raw) = lot_size {
                steps.insert(info.symbol.clone(), self.parse_decimal("stepSize", raw)?);
            }
        }
        Ok(steps)
    }
}
