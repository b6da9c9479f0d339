use std::sync::Arc;

use anyhow::Context;
use dotenvy::dotenv;
use tracing::{debug, info, warn};

use common::config::AppConfig;
use common::logger;
use exchange::BinanceClient;

use crate::services::execution_service::TradeExecutor;
use crate::services::signal_service::SignalService;
use crate::services::telegram_service::TelegramService;

mod services;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    logger::setup_logger();
    debug!("System starting up...");

    let config = AppConfig::from_env().context("loading configuration")?;
    info!("Configuration loaded: {}", config.summary());

    let client = BinanceClient::new(&config.binance).context("building Binance client")?;
    client
        .verify_connection()
        .await
        .context("verifying Binance futures account")?;

    let executor = TradeExecutor::new(Arc::new(client), config.trading.clone());
    let signals = Arc::new(SignalService::new(executor));

    warn!("⚠️ NO STOP LOSS: stop-loss values in signals are ignored. Manage risk manually.");
    info!("Max margin per trade: ${}", config.trading.max_margin);

    TelegramService::new(&config.telegram, signals).start().await;
    Ok(())
}
