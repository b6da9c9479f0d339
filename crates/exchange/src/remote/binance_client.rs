use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use common::config::BinanceConfig;
use common::models::{OpenPosition, OrderAck, OrderSide};
use hmac::{Hmac, Mac};
use reqwest::{Client, Method, Response};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use sha2::Sha256;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use crate::error::GatewayError;
use crate::remote::account_response::{AccountBalance, FuturesAccountResponse};
use crate::remote::error_response::{error_from_body, is_margin_type_unchanged};
use crate::remote::exchange_info_response::ExchangeInfoResponse;
use crate::remote::order_response::{LeverageResponse, OrderResponse};
use crate::remote::position_response::PositionRiskResponse;
use crate::traits::{ExchangeGateway, MarginTypeStatus, RemoteResponse};

type HmacSha256 = Hmac<Sha256>;

/// Signed client for the Binance USDⓈ-M Futures REST API.
#[derive(Clone)]
pub struct BinanceClient {
    client: Client,
    base_url: String,
    api_key: String,
    secret_key: String,
    recv_window_ms: u64,
    step_sizes: Arc<RwLock<HashMap<String, Decimal>>>,
}

impl BinanceClient {
    pub fn new(config: &BinanceConfig) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .user_agent("signal_trader/0.1.0")
            .timeout(config.timeout)
            .build()
            .map_err(|e| GatewayError::Connectivity(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            secret_key: config.api_secret.clone(),
            recv_window_ms: config.recv_window_ms,
            step_sizes: Arc::new(RwLock::new(HashMap::new())),
        })
    }

    fn sign(&self, query: &str) -> Result<String, GatewayError> {
        sign_query(&self.secret_key, query)
    }

    /// Startup check: credentials work and the futures account is reachable.
    pub async fn verify_connection(&self) -> Result<AccountBalance, GatewayError> {
        let balance = self.account().await?;
        info!("Connected to Binance Futures at {}", self.base_url);
        info!("Total Wallet Balance: ${} USDT", balance.wallet.round_dp(2));
        warn!("TRADING WITH REAL FUNDS");
        Ok(balance)
    }

    async fn account(&self) -> Result<AccountBalance, GatewayError> {
        let response: FuturesAccountResponse =
            self.signed(Method::GET, "/fapi/v2/account", &[]).await?;
        response.to_domain()
    }

    async fn signed<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, GatewayError> {
        let mut query: Vec<String> = params.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
        query.push(format!("recvWindow={}", self.recv_window_ms));
        query.push(format!("timestamp={}", Utc::now().timestamp_millis()));
        let query = query.join("&");

        let signature = self.sign(&query)?;
        let url = format!("{}{}?{}&signature={}", self.base_url, path, query, signature);
        debug!("{} {}", method, path);

        let resp = self
            .client
            .request(method, &url)
            .header("X-MBX-APIKEY", &self.api_key)
            .send()
            .await?;

        Self::decode(path, resp).await
    }

    async fn public<T: DeserializeOwned>(&self, path: &str) -> Result<T, GatewayError> {
        let url = format!("{}{}", self.base_url, path);
        let resp = self.client.get(&url).send().await?;
        Self::decode(path, resp).await
    }

    async fn decode<T: DeserializeOwned>(path: &str, resp: Response) -> Result<T, GatewayError> {
        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            error!("Binance {} failed ({}): {}", path, status, body);
            return Err(error_from_body(status.as_u16(), &body));
        }

        serde_json::from_str::<T>(&body).map_err(|e| GatewayError::Decode(format!("{}: {}", path, e)))
    }

    async fn refresh_step_sizes(&self) -> Result<(), GatewayError> {
        let info: ExchangeInfoResponse = self.public("/fapi/v1/exchangeInfo").await?;
        let steps = info.to_domain()?;
        info!("Loaded lot sizes for {} symbols", steps.len());
        *self.step_sizes.write().await = steps;
        Ok(())
    }
}

#[async_trait]
impl ExchangeGateway for BinanceClient {
    async fn available_balance(&self) -> Result<Decimal, GatewayError> {
        Ok(self.account().await?.available)
    }

    async fn open_positions(&self) -> Result<Vec<OpenPosition>, GatewayError> {
        let rows: Vec<PositionRiskResponse> =
            self.signed(Method::GET, "/fapi/v2/positionRisk", &[]).await?;
        rows.iter().map(|r| r.to_domain()).collect()
    }

    async fn set_isolated_margin(&self, symbol: &str) -> Result<MarginTypeStatus, GatewayError> {
        let params = [
            ("symbol", symbol.to_string()),
            ("marginType", "ISOLATED".to_string()),
        ];
        let result = self
            .signed::<serde_json::Value>(Method::POST, "/fapi/v1/marginType", &params)
            .await
            .map(|_| ());

        let status = classify_margin_type(result)?;
        match status {
            MarginTypeStatus::Changed => info!("Set margin type to ISOLATED for {}", symbol),
            MarginTypeStatus::AlreadySet => info!("Margin type already ISOLATED for {}", symbol),
        }
        Ok(status)
    }

    async fn set_leverage(&self, symbol: &str, leverage: u32) -> Result<(), GatewayError> {
        let params = [
            ("symbol", symbol.to_string()),
            ("leverage", leverage.to_string()),
        ];
        let resp: LeverageResponse = self
            .signed(Method::POST, "/fapi/v1/leverage", &params)
            .await?;
        info!("Set leverage to {}x for {}", resp.leverage, resp.symbol);
        Ok(())
    }

    async fn lot_step_size(&self, symbol: &str) -> Result<Option<Decimal>, GatewayError> {
        if let Some(step) = self.step_sizes.read().await.get(symbol) {
            return Ok(Some(*step));
        }

        // Cache miss covers both first use and symbols listed after the last load.
        self.refresh_step_sizes().await?;
        Ok(self.step_sizes.read().await.get(symbol).copied())
    }

    async fn place_market_order(
        &self,
        symbol: &str,
        side: OrderSide,
        quantity: Decimal,
    ) -> Result<OrderAck, GatewayError> {
        info!("Placing market order: {} {} {}", side, quantity, symbol);
        let params = [
            ("symbol", symbol.to_string()),
            ("side", side.as_str().to_string()),
            ("type", "MARKET".to_string()),
            ("quantity", quantity.normalize().to_string()),
        ];
        let resp: OrderResponse = self.signed(Method::POST, "/fapi/v1/order", &params).await?;
        info!("Market order placed: ID={}, Status={}", resp.order_id, resp.status);
        resp.to_domain()
    }

    async fn place_take_profit_order(
        &self,
        symbol: &str,
        side: OrderSide,
        quantity: Decimal,
        trigger_price: Decimal,
    ) -> Result<OrderAck, GatewayError> {
        // closePosition closes whatever is open, so quantity is not sent.
        info!(
            "Placing take profit: {} {} {} @ {}",
            side, quantity, symbol, trigger_price
        );
        let params = [
            ("symbol", symbol.to_string()),
            ("side", side.as_str().to_string()),
            ("type", "TAKE_PROFIT_MARKET".to_string()),
            ("stopPrice", trigger_price.normalize().to_string()),
            ("closePosition", "true".to_string()),
        ];
        let resp: OrderResponse = self.signed(Method::POST, "/fapi/v1/order", &params).await?;
        info!("Take profit placed: ID={}, Status={}", resp.order_id, resp.status);
        resp.to_domain()
    }
}

fn sign_query(secret: &str, query: &str) -> Result<String, GatewayError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| GatewayError::Signing(e.to_string()))?;
    mac.update(query.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

fn classify_margin_type(result: Result<(), GatewayError>) -> Result<MarginTypeStatus, GatewayError> {
    match result {
        Ok(()) => Ok(MarginTypeStatus::Changed),
        Err(e) if is_margin_type_unchanged(&e) => Ok(MarginTypeStatus::AlreadySet),
        Err(e) => Err(e),
    }
}
