//! Webhook receiver for Telegram updates.
//!
//! Telegram POSTs one update per request; the handler decodes it, runs the
//! dispatcher, and performs whatever call the dispatcher decided on. A
//! malformed body is rejected by the `Json` extractor with a client error
//! before the handler runs.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde::Deserialize;
use teloxide::Bot;
use tracing::{debug, error, info};

use crate::config::Config;
use crate::dispatch::{dispatch, Inbound};
use crate::outbound;

/// Shared application state
pub struct AppState {
    pub bot: Bot,
    pub config: Config,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let bot = Bot::new(&config.telegram.bot_token);
        Self { bot, config }
    }
}

// ── Wire types ─────────────────────────────────────────────────────────────
//
// Telegram's Update object carries far more than this; serde drops the
// fields the bot never reads.

#[derive(Debug, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
    pub pre_checkout_query: Option<PreCheckoutQuery>,
}

#[derive(Debug, Deserialize)]
pub struct Message {
    pub chat: Chat,
    pub text: Option<String>,
    pub successful_payment: Option<SuccessfulPayment>,
}

#[derive(Debug, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Deserialize)]
pub struct SuccessfulPayment {
    pub currency: String,
    pub total_amount: u32,
    pub invoice_payload: String,
}

#[derive(Debug, Deserialize)]
pub struct PreCheckoutQuery {
    pub id: String,
    pub currency: String,
    pub total_amount: u32,
    pub invoice_payload: String,
}

// ── Router and handler ─────────────────────────────────────────────────────

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/telegram-webhook", post(receive_update))
        .with_state(state)
}

async fn receive_update(
    State(state): State<Arc<AppState>>,
    Json(update): Json<Update>,
) -> StatusCode {
    let Some(inbound) = extract(update) else {
        return StatusCode::OK;
    };

    if let Some(reply) = dispatch(&inbound, &state.config) {
        // Failures are logged, not retried; a non-2xx here would make
        // Telegram redeliver the update.
        if let Err(e) = outbound::send_reply(&state.bot, &state.config, reply).await {
            error!("Failed to send reply: {:#}", e);
        }
    }

    StatusCode::OK
}

/// Reduces an update to the parts the dispatcher reads. Messages win over
/// pre-checkout queries; Telegram never sends both in one update.
fn extract(update: Update) -> Option<Inbound> {
    if let Some(message) = update.message {
        let text = message.text.unwrap_or_default();
        info!(
            "Update {}: chat {} text {:?}",
            update.update_id, message.chat.id, text
        );

        let payment_payload = match message.successful_payment {
            Some(payment) => {
                info!(
                    "Update {}: payment of {} {} confirmed in chat {}",
                    update.update_id, payment.total_amount, payment.currency, message.chat.id
                );
                Some(payment.invoice_payload)
            }
            None => None,
        };

        return Some(Inbound::Message {
            chat_id: message.chat.id,
            text,
            payment_payload,
        });
    }

    if let Some(query) = update.pre_checkout_query {
        info!(
            "Update {}: pre-checkout query {} over {} {}",
            update.update_id, query.id, query.total_amount, query.currency
        );
        return Some(Inbound::PreCheckout {
            query_id: query.id,
            payload: query.invoice_payload,
        });
    }

    debug!("Update {} carries nothing this bot handles", update.update_id);
    None
}
