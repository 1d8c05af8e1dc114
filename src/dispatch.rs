//! Maps one inbound Telegram event to at most one outbound action.
//!
//! Everything the decision depends on arrives as an explicit parameter, so
//! the whole flow is testable without a server or a bot token.

use tracing::warn;

use crate::config::Config;

pub const AMOUNT_PROMPT: &str = "Please enter the amount";
pub const THANKS: &str = "Thank you for paying!";
pub const INVALID: &str = "Invalid information. Please check /help for more information.";

/// A decoded inbound event, reduced to the fields the dispatcher reads.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    /// A chat message. `text` is empty for text-less messages; payment
    /// confirmations arrive that way, carrying the invoice payload.
    Message {
        chat_id: i64,
        text: String,
        payment_payload: Option<String>,
    },
    /// Telegram's final confirmation request before charging the user.
    PreCheckout { query_id: String, payload: String },
}

/// An outbound call decided by [`dispatch`] and performed by the
/// `outbound` module.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Text {
        chat_id: i64,
        text: String,
    },
    /// Welcome text plus a reply keyboard, one button per row.
    Menu {
        chat_id: i64,
        text: String,
        buttons: Vec<String>,
    },
    /// Payment request over `subtotal` minor currency units.
    Invoice {
        chat_id: i64,
        subtotal: u32,
    },
    ApprovePreCheckout {
        query_id: String,
    },
}

pub fn dispatch(inbound: &Inbound, config: &Config) -> Option<Reply> {
    let payment = &config.payment;

    match inbound {
        Inbound::PreCheckout { query_id, payload } => {
            // Approved without validation; the payload only tells us whether
            // the invoice predates a config change.
            if *payload != payment.payload {
                warn!(
                    "Pre-checkout payload {:?} does not match configured {:?}",
                    payload, payment.payload
                );
            }
            Some(Reply::ApprovePreCheckout {
                query_id: query_id.clone(),
            })
        }
        Inbound::Message {
            chat_id,
            text,
            payment_payload,
        } => {
            let chat_id = *chat_id;

            if text == "/start" || text == "/help" || text == "Help" {
                return Some(Reply::Menu {
                    chat_id,
                    text: payment.welcome.clone(),
                    buttons: vec![payment.pay_button(), "Help".to_string()],
                });
            }

            if *text == payment.pay_button() {
                return Some(Reply::Text {
                    chat_id,
                    text: AMOUNT_PROMPT.to_string(),
                });
            }

            if text.is_empty() {
                // Payment confirmations have no text. Anything else without
                // text (stickers, photos) is ignored.
                return match payment_payload {
                    Some(p) if *p == payment.payload => Some(Reply::Text {
                        chat_id,
                        text: THANKS.to_string(),
                    }),
                    _ => None,
                };
            }

            match text.parse::<u32>() {
                Ok(amount) if amount >= payment.min_amount => amount
                    .checked_mul(100)
                    .map(|subtotal| Reply::Invoice { chat_id, subtotal })
                    .or_else(|| {
                        Some(Reply::Text {
                            chat_id,
                            text: INVALID.to_string(),
                        })
                    }),
                _ => Some(Reply::Text {
                    chat_id,
                    text: INVALID.to_string(),
                }),
            }
        }
    }
}
