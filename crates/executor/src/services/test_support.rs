use std::future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use common::config::TradingConfig;
use common::models::{
    Direction, ExecutionStage, OpenPosition, OrderAck, OrderSide, Signal, SignalDraft,
};
use exchange::{ExchangeGateway, GatewayError, MarginTypeStatus};
use mockall::mock;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tokio::sync::Notify;

mock! {
    pub Gateway {}

    #[async_trait]
    impl ExchangeGateway for Gateway {
        async fn available_balance(&self) -> Result<Decimal, GatewayError>;
        async fn open_positions(&self) -> Result<Vec<OpenPosition>, GatewayError>;
        async fn set_isolated_margin(&self, symbol: &str) -> Result<MarginTypeStatus, GatewayError>;
        async fn set_leverage(&self, symbol: &str, leverage: u32) -> Result<(), GatewayError>;
        async fn lot_step_size(&self, symbol: &str) -> Result<Option<Decimal>, GatewayError>;
        async fn place_market_order(
            &self,
            symbol: &str,
            side: OrderSide,
            quantity: Decimal,
        ) -> Result<OrderAck, GatewayError>;
        async fn place_take_profit_order(
            &self,
            symbol: &str,
            side: OrderSide,
            quantity: Decimal,
            trigger_price: Decimal,
        ) -> Result<OrderAck, GatewayError>;
    }
}

pub fn trading_config(timeout: Duration) -> TradingConfig {
    TradingConfig {
        max_margin: dec!(100),
        exchange_timeout: timeout,
    }
}

/// LONG BTCUSDT, entry 60000, TP 62000, 10x, $50 margin.
pub fn long_signal() -> Signal {
    signal_with_margin(dec!(50))
}

pub fn signal_with_margin(margin: Decimal) -> Signal {
    Signal::try_from_draft(SignalDraft {
        direction: Direction::Long,
        symbol: "BTCUSDT".to_string(),
        entry: dec!(60000),
        take_profit: dec!(62000),
        stop_loss: Some(dec!(59000)),
        leverage: 10,
        margin,
    })
    .unwrap()
}

pub fn ack(order_id: u64) -> OrderAck {
    OrderAck {
        order_id,
        symbol: "BTCUSDT".to_string(),
        status: "NEW".to_string(),
    }
}

/// Gateway whose position query waits until the test releases it, then reports
/// an open position. Every other call fails.
#[derive(Default)]
pub struct GatedGateway {
    pub entered: Notify,
    pub release: Notify,
}

#[async_trait]
impl ExchangeGateway for GatedGateway {
    async fn available_balance(&self) -> Result<Decimal, GatewayError> {
        Err(GatewayError::Connectivity("unused".to_string()))
    }

    async fn open_positions(&self) -> Result<Vec<OpenPosition>, GatewayError> {
        self.entered.notify_one();
        self.release.notified().await;
        Ok(vec![OpenPosition {
            symbol: "ETHUSDT".to_string(),
            quantity: dec!(1),
        }])
    }

    async fn set_isolated_margin(&self, _symbol: &str) -> Result<MarginTypeStatus, GatewayError> {
        Err(GatewayError::Connectivity("unused".to_string()))
    }

    async fn set_leverage(&self, _symbol: &str, _leverage: u32) -> Result<(), GatewayError> {
        Err(GatewayError::Connectivity("unused".to_string()))
    }

    async fn lot_step_size(&self, _symbol: &str) -> Result<Option<Decimal>, GatewayError> {
        Err(GatewayError::Connectivity("unused".to_string()))
    }

    async fn place_market_order(
        &self,
        _symbol: &str,
        _side: OrderSide,
        _quantity: Decimal,
    ) -> Result<OrderAck, GatewayError> {
        Err(GatewayError::Connectivity("unused".to_string()))
    }

    async fn place_take_profit_order(
        &self,
        _symbol: &str,
        _side: OrderSide,
        _quantity: Decimal,
        _trigger_price: Decimal,
    ) -> Result<OrderAck, GatewayError> {
        Err(GatewayError::Connectivity("unused".to_string()))
    }
}

/// Gateway that answers every call like a healthy account and never returns from
/// the call made at `stall_at`.
pub struct StallingGateway {
    stall_at: ExecutionStage,
    pub take_profit_calls: AtomicUsize,
}

impl StallingGateway {
    pub fn new(stall_at: ExecutionStage) -> Self {
        Self {
            stall_at,
            take_profit_calls: AtomicUsize::new(0),
        }
    }

    async fn answer<T>(&self, stage: ExecutionStage, value: T) -> Result<T, GatewayError> {
        if stage == self.stall_at {
            future::pending::<()>().await;
        }
        Ok(value)
    }
}

#[async_trait]
impl ExchangeGateway for StallingGateway {
    async fn available_balance(&self) -> Result<Decimal, GatewayError> {
        self.answer(ExecutionStage::BalanceGate, dec!(500)).await
    }

    async fn open_positions(&self) -> Result<Vec<OpenPosition>, GatewayError> {
        self.answer(ExecutionStage::OpenPositionGate, Vec::new()).await
    }

    async fn set_isolated_margin(&self, _symbol: &str) -> Result<MarginTypeStatus, GatewayError> {
        self.answer(ExecutionStage::ConfigureMargin, MarginTypeStatus::Changed)
            .await
    }

    async fn set_leverage(&self, _symbol: &str, _leverage: u32) -> Result<(), GatewayError> {
        self.answer(ExecutionStage::ConfigureLeverage, ()).await
    }

    async fn lot_step_size(&self, _symbol: &str) -> Result<Option<Decimal>, GatewayError> {
        self.answer(ExecutionStage::SizeQuantity, Some(dec!(0.001)))
            .await
    }

    async fn place_market_order(
        &self,
        _symbol: &str,
        _side: OrderSide,
        _quantity: Decimal,
    ) -> Result<OrderAck, GatewayError> {
        self.answer(ExecutionStage::PlaceEntry, ack(1001)).await
    }

    async fn place_take_profit_order(
        &self,
        _symbol: &str,
        _side: OrderSide,
        _quantity: Decimal,
        _trigger_price: Decimal,
    ) -> Result<OrderAck, GatewayError> {
        self.take_profit_calls.fetch_add(1, Ordering::SeqCst);
        self.answer(ExecutionStage::PlaceTakeProfit, ack(1002)).await
    }
}
