use std::future::Future;
use std::sync::Arc;

use common::config::TradingConfig;
use common::models::{
    BlockReason, ExecutionOutcome, ExecutionReport, ExecutionStage, OpenPosition, PartialFailure,
    RejectReason, Signal,
};
use exchange::{ExchangeGateway, GatewayError};
use rust_decimal::Decimal;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{error, info, warn};

use crate::services::position_sizer::{PositionSizer, SizingError};

/// Runs one signal through the gates, exchange setup and the two-order placement.
///
/// Stages run strictly in order and never go back:
/// open-position gate, margin limit, balance, isolated margin, leverage, sizing,
/// market entry, take profit. Everything before the entry order is a safe abort;
/// a failed take profit after a filled entry is reported as `PartialFailure`.
pub struct TradeExecutor<G: ExchangeGateway> {
    gateway: Arc<G>,
    config: TradingConfig,
    in_flight: Mutex<()>,
}

impl<G: ExchangeGateway> TradeExecutor<G> {
    pub fn new(gateway: Arc<G>, config: TradingConfig) -> Self {
        Self {
            gateway,
            config,
            in_flight: Mutex::new(()),
        }
    }

    pub async fn execute(&self, signal: &Signal) -> ExecutionOutcome {
        // One execution at a time; a second signal does not queue behind the first.
        let Ok(_guard) = self.in_flight.try_lock() else {
            warn!(
                "Execution already in flight, blocking {} {}",
                signal.direction(),
                signal.symbol()
            );
            return ExecutionOutcome::Blocked(BlockReason::ExecutionInFlight);
        };

        info!("Executing {} trade for {}", signal.direction(), signal.symbol());
        let outcome = match self.run(signal).await {
            Ok(report) => ExecutionOutcome::Success(report),
            Err(outcome) => outcome,
        };
        log_outcome(&outcome);
        outcome
    }

    async fn run(&self, signal: &Signal) -> Result<ExecutionReport, ExecutionOutcome> {
        let symbol = signal.symbol();
        let margin = signal.margin();

        let positions = self
            .call(ExecutionStage::OpenPositionGate, self.gateway.open_positions())
            .await
            .map_err(|e| unavailable(ExecutionStage::OpenPositionGate, e))?;
        let open: Vec<OpenPosition> = positions.into_iter().filter(|p| p.is_open()).collect();
        if !open.is_empty() {
            return Err(ExecutionOutcome::Blocked(BlockReason::OpenPositions(open)));
        }

        if margin > self.config.max_margin {
            return Err(ExecutionOutcome::Blocked(BlockReason::MarginLimitExceeded {
                margin,
                limit: self.config.max_margin,
            }));
        }

        let available = self
            .call(ExecutionStage::BalanceGate, self.gateway.available_balance())
            .await
            .map_err(|e| unavailable(ExecutionStage::BalanceGate, e))?;
        if available < margin {
            return Err(ExecutionOutcome::Blocked(BlockReason::InsufficientBalance {
                available,
                required: margin,
            }));
        }
        info!(
            "Sufficient balance: ${} available, ${} required",
            available, margin
        );

        self.call(
            ExecutionStage::ConfigureMargin,
            self.gateway.set_isolated_margin(symbol),
        )
        .await
        .map_err(|e| configuration(ExecutionStage::ConfigureMargin, e))?;

        self.call(
            ExecutionStage::ConfigureLeverage,
            self.gateway.set_leverage(symbol, signal.leverage()),
        )
        .await
        .map_err(|e| configuration(ExecutionStage::ConfigureLeverage, e))?;

        let quantity = self
            .size(signal)
            .await
            .map_err(|e| configuration(ExecutionStage::SizeQuantity, e))?;

        let entry_side = signal.direction().entry_side();
        info!("Step 1/2: placing market entry order");
        let entry_order = self
            .call(
                ExecutionStage::PlaceEntry,
                self.gateway.place_market_order(symbol, entry_side, quantity),
            )
            .await
            .map_err(|e| {
                if e.is_connectivity() {
                    error!(
                        "Entry order for {} may or may not have reached the exchange: {}. Check open positions.",
                        symbol, e
                    );
                }
                ExecutionOutcome::Rejected(RejectReason::Entry {
                    detail: e.to_string(),
                    uncertain: e.is_connectivity(),
                })
            })?;

        info!("Step 2/2: placing take profit order");
        let tp_order = self
            .call(
                ExecutionStage::PlaceTakeProfit,
                self.gateway.place_take_profit_order(
                    symbol,
                    signal.direction().exit_side(),
                    quantity,
                    signal.take_profit(),
                ),
            )
            .await
            .map_err(|e| {
                ExecutionOutcome::PartialFailure(PartialFailure {
                    symbol: symbol.to_string(),
                    position_side: entry_side,
                    quantity,
                    entry_order_id: entry_order.order_id,
                    intended_take_profit: signal.take_profit(),
                    detail: e.to_string(),
                })
            })?;

        Ok(ExecutionReport {
            symbol: symbol.to_string(),
            direction: signal.direction(),
            entry_side,
            quantity,
            entry_price: signal.entry(),
            take_profit: signal.take_profit(),
            leverage: signal.leverage(),
            margin,
            entry_order_id: entry_order.order_id,
            take_profit_order_id: tp_order.order_id,
            ignored_stop_loss: signal.stop_loss(),
        })
    }

    async fn size(&self, signal: &Signal) -> Result<Decimal, SizingError> {
        let sizing = PositionSizer::size(
            &*self.gateway,
            signal.symbol(),
            signal.margin(),
            signal.leverage(),
            signal.entry(),
        );
        match timeout(self.config.exchange_timeout, sizing).await {
            Ok(result) => result,
            Err(_) => Err(SizingError::Gateway(GatewayError::Timeout(
                self.config.exchange_timeout,
            ))),
        }
    }

    /// Bounds a single exchange call by the configured timeout.
    async fn call<T, F>(&self, stage: ExecutionStage, request: F) -> Result<T, GatewayError>
    where
        F: Future<Output = Result<T, GatewayError>>,
    {
        match timeout(self.config.exchange_timeout, request).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    "{} timed out after {:?}",
                    stage, self.config.exchange_timeout
                );
                Err(GatewayError::Timeout(self.config.exchange_timeout))
            }
        }
    }
}

fn unavailable(stage: ExecutionStage, e: GatewayError) -> ExecutionOutcome {
    ExecutionOutcome::Rejected(RejectReason::Unavailable {
        stage,
        detail: e.to_string(),
    })
}

fn configuration(stage: ExecutionStage, e: impl std::fmt::Display) -> ExecutionOutcome {
    ExecutionOutcome::Rejected(RejectReason::Configuration {
        stage,
        detail: e.to_string(),
    })
}

fn log_outcome(outcome: &ExecutionOutcome) {
    match outcome {
        ExecutionOutcome::Success(report) => {
            info!(
                "Trade executed: {} {} qty {} entry order {} take profit order {} @ {}",
                report.entry_side,
                report.symbol,
                report.quantity,
                report.entry_order_id,
                report.take_profit_order_id,
                report.take_profit
            );
            match report.ignored_stop_loss {
                Some(sl) => warn!("NO STOP LOSS ORDER - signal SL {} was not placed", sl),
                None => warn!("NO STOP LOSS ORDER - position is not protected by SL"),
            }
        }
        ExecutionOutcome::Blocked(reason) => warn!("Trade blocked: {}", reason),
        ExecutionOutcome::Rejected(reason) => {
            error!("Trade aborted at {}: {}", reason.stage(), reason)
        }
        ExecutionOutcome::PartialFailure(p) => {
            error!(
                "UNPROTECTED POSITION: entry order {} filled ({} {} {}) but take profit @ {} failed: {}",
                p.entry_order_id, p.position_side, p.quantity, p.symbol, p.intended_take_profit, p.detail
            );
            error!("Set the take profit manually or close the position");
        }
    }
}
