pub mod account_response;
pub mod binance_client;
pub mod error_response;
pub mod exchange_info_response;
pub mod order_response;
pub mod position_response;

pub use account_response::AccountBalance;
pub use binance_client::BinanceClient;
