use common::models::ExecutionOutcome;
use exchange::ExchangeGateway;
use signals::SignalError;
use tracing::{debug, info, warn};

use crate::services::execution_service::TradeExecutor;

/// What became of one incoming message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignalHandling {
    /// Ordinary chat without a signal marker.
    Ignored,
    /// Looked like a signal but could not be traded.
    Rejected(SignalError),
    Executed(ExecutionOutcome),
}

pub struct SignalService<G: ExchangeGateway> {
    executor: TradeExecutor<G>,
}

impl<G: ExchangeGateway> SignalService<G> {
    pub fn new(executor: TradeExecutor<G>) -> Self {
        Self { executor }
    }

    pub async fn handle_text(&self, text: &str) -> SignalHandling {
        let signal = match signals::parse(text) {
            Ok(signal) => signal,
            Err(e) if e.is_silent() => {
                debug!("Message is not a trading signal");
                return SignalHandling::Ignored;
            }
            Err(e) => {
                warn!("Signal rejected: {}", e);
                return SignalHandling::Rejected(e);
            }
        };

        info!("Valid trading signal detected");
        debug!("Signal:\n{}", signals::render(&signal));

        SignalHandling::Executed(self.executor.execute(&signal).await)
    }
}
