use std::sync::Arc;

use common::config::TelegramConfig;
use exchange::ExchangeGateway;
use teloxide::prelude::*;
use tracing::{debug, error, info, warn};

use crate::services::signal_service::{SignalHandling, SignalService};

/// The one chat whose messages are read as signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SignalChat(ChatId);

/// Listens to the configured group or channel and feeds its text into the signal pipeline.
pub struct TelegramService<G: ExchangeGateway + 'static> {
    bot: Bot,
    chat: SignalChat,
    signals: Arc<SignalService<G>>,
}

impl<G: ExchangeGateway + 'static> TelegramService<G> {
    pub fn new(config: &TelegramConfig, signals: Arc<SignalService<G>>) -> Self {
        Self {
            bot: Bot::new(&config.bot_token),
            chat: SignalChat(ChatId(config.chat_id)),
            signals,
        }
    }

    /// Runs until Ctrl-C.
    pub async fn start(self) {
        info!("Starting Telegram listener for chat {}", self.chat.0);
        info!("Supports both groups and channels");

        let handler = dptree::entry()
            .branch(Update::filter_message().endpoint(Self::on_message))
            .branch(Update::filter_channel_post().endpoint(Self::on_message));

        Dispatcher::builder(self.bot, handler)
            .dependencies(dptree::deps![self.signals, self.chat])
            .default_handler(|_| async {})
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;

        info!("Telegram listener stopped");
    }

    async fn on_message(
        bot: Bot,
        msg: Message,
        signals: Arc<SignalService<G>>,
        chat: SignalChat,
    ) -> ResponseResult<()> {
        if msg.chat.id != chat.0 {
            return Ok(());
        }
        let Some(text) = msg.text() else {
            return Ok(());
        };

        info!("Received message from chat {}", msg.chat.id);
        debug!("Message text: {}", text.chars().take(100).collect::<String>());

        let handling = signals.handle_text(text).await;
        if let Some(reply) = reply_for(&handling, msg.chat.is_channel()) {
            if let Err(e) = bot.send_message(msg.chat.id, reply).await {
                if matches!(handling, SignalHandling::Executed(ref o) if o.is_partial_failure()) {
                    error!("Could not announce unprotected position to chat: {}", e);
                } else {
                    warn!("Could not send reply: {}", e);
                }
            }
        }
        Ok(())
    }
}

/// Channels only hear about unprotected positions; groups get every result.
fn reply_for(handling: &SignalHandling, is_channel: bool) -> Option<String> {
    match handling {
        SignalHandling::Ignored => None,
        SignalHandling::Executed(outcome) if outcome.is_partial_failure() => {
            Some(outcome.to_string())
        }
        _ if is_channel => None,
        SignalHandling::Rejected(e) => Some(format!("⚠️ Signal rejected: {}", e)),
        SignalHandling::Executed(outcome) => Some(outcome.to_string()),
    }
}
