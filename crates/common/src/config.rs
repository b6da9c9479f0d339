use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use rust_decimal::Decimal;
use thiserror::Error;

pub const DEFAULT_BINANCE_BASE_URL: &str = "https://fapi.binance.com";
pub const DEFAULT_MAX_MARGIN_LIMIT: Decimal = Decimal::ONE_HUNDRED;
pub const DEFAULT_EXCHANGE_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_RECV_WINDOW_MS: u64 = 5_000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variables: {}", .0.join(", "))]
    Missing(Vec<&'static str>),
    #[error("invalid value {value:?} for {var}")]
    Invalid { var: &'static str, value: String },
}

#[derive(Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
    /// The only chat (group or channel) whose messages are treated as signals.
    pub chat_id: i64,
}

#[derive(Clone)]
pub struct BinanceConfig {
    pub api_key: String,
    pub api_secret: String,
    pub base_url: String,
    pub recv_window_ms: u64,
    pub timeout: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradingConfig {
    /// Signals asking for more margin than this are blocked.
    pub max_margin: Decimal,
    /// Upper bound on every single exchange call.
    pub exchange_timeout: Duration,
}

#[derive(Clone)]
pub struct AppConfig {
    pub telegram: TelegramConfig,
    pub binance: BinanceConfig,
    pub trading: TradingConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &'static str, missing: &mut Vec<&'static str>| {
            match lookup(key).filter(|v| !v.trim().is_empty()) {
                Some(v) => v,
                None => {
                    missing.push(key);
                    String::new()
                }
            }
        };

        let mut missing = Vec::new();
        let bot_token = read("TELEGRAM_BOT_TOKEN", &mut missing);
        let chat_id = read("TELEGRAM_CHAT_ID", &mut missing);
        let api_key = read("BINANCE_API_KEY", &mut missing);
        let api_secret = read("BINANCE_API_SECRET", &mut missing);
        if !missing.is_empty() {
            return Err(ConfigError::Missing(missing));
        }

        let chat_id = parse_value("TELEGRAM_CHAT_ID", chat_id.trim())?;
        let base_url = lookup("BINANCE_BASE_URL")
            .map(|v| v.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_BINANCE_BASE_URL.to_string());
        let max_margin = optional(&lookup, "MAX_MARGIN_LIMIT", DEFAULT_MAX_MARGIN_LIMIT)?;
        let timeout_secs: u64 = optional(
            &lookup,
            "EXCHANGE_TIMEOUT_SECS",
            DEFAULT_EXCHANGE_TIMEOUT_SECS,
        )?;
        let recv_window_ms = optional(&lookup, "BINANCE_RECV_WINDOW_MS", DEFAULT_RECV_WINDOW_MS)?;

        if max_margin <= Decimal::ZERO {
            return Err(ConfigError::Invalid {
                var: "MAX_MARGIN_LIMIT",
                value: max_margin.to_string(),
            });
        }
        if timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                var: "EXCHANGE_TIMEOUT_SECS",
                value: timeout_secs.to_string(),
            });
        }

        let timeout = Duration::from_secs(timeout_secs);
        Ok(Self {
            telegram: TelegramConfig { bot_token, chat_id },
            binance: BinanceConfig {
                api_key,
                api_secret,
                base_url,
                recv_window_ms,
                timeout,
            },
            trading: TradingConfig {
                max_margin,
                exchange_timeout: timeout,
            },
        })
    }

    /// One-line description safe to log: no secrets.
    pub fn summary(&self) -> String {
        format!(
            "chat_id={} exchange={} max_margin=${} exchange_timeout={}s recv_window={}ms",
            self.telegram.chat_id,
            self.binance.base_url,
            self.trading.max_margin,
            self.trading.exchange_timeout.as_secs(),
            self.binance.recv_window_ms,
        )
    }
}

fn parse_value<T: FromStr>(var: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.parse::<T>().map_err(|_| ConfigError::Invalid {
        var,
        value: raw.to_string(),
    })
}

fn optional<T, F>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(var).filter(|v| !v.trim().is_empty()) {
        Some(raw) => parse_value(var, raw.trim()),
        None => Ok(default),
    }
}

impl fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("bot_token", &"<redacted>")
            .field("chat_id", &self.chat_id)
            .finish()
    }
}

impl fmt::Debug for BinanceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BinanceConfig")
            .field("api_key", &"<redacted>")
            .field("api_secret", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("recv_window_ms", &self.recv_window_ms)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("telegram", &self.telegram)
            .field("binance", &self.binance)
            .field("trading", &self.trading)
            .finish()
    }
}
