//! Performs the Telegram Bot API calls decided by the dispatcher.

use anyhow::{Context, Result};
use teloxide::requests::Requester;
use teloxide::types::{ChatId, KeyboardButton, KeyboardMarkup, LabeledPrice, ReplyMarkup};
use teloxide::Bot;
use tracing::{debug, info};
use url::Url;

use crate::config::Config;
use crate::dispatch::Reply;

/// Registers the configured public URL with Telegram so updates start
/// arriving at the webhook endpoint.
pub async fn register_webhook(bot: &Bot, webhook_url: &str) -> Result<()> {
    let url: Url = webhook_url
        .parse()
        .with_context(|| format!("Invalid webhook URL: {webhook_url}"))?;

    bot.set_webhook(url)
        .await
        .context("setWebhook call failed")?;

    info!("Webhook registered: {}", webhook_url);
    Ok(())
}

pub async fn send_reply(bot: &Bot, config: &Config, reply: Reply) -> Result<()> {
    match reply {
        Reply::Text { chat_id, text } => {
            bot.send_message(ChatId(chat_id), text)
                .await
                .context("sendMessage call failed")?;
        }
        Reply::Menu {
            chat_id,
            text,
            buttons,
        } => {
            let mut req = bot.send_message(ChatId(chat_id), text);
            req.reply_markup = Some(ReplyMarkup::Keyboard(KeyboardMarkup::new(keyboard_rows(
                buttons,
            ))));
            req.await.context("sendMessage call failed")?;
        }
        Reply::Invoice { chat_id, subtotal } => {
            let payment = &config.payment;
            debug!(
                "Sending invoice to chat {}: {} minor units of {}",
                chat_id, subtotal, payment.currency
            );

            let mut req = bot.send_invoice(
                ChatId(chat_id),
                payment.item.clone(),
                format!("Payment for {}", payment.item),
                payment.payload.clone(),
                payment.currency.clone(),
                invoice_prices(subtotal),
            );
            if !config.telegram.provider_token.is_empty() {
                req.provider_token = Some(config.telegram.provider_token.clone());
            }
            req.await.context("sendInvoice call failed")?;
        }
        Reply::ApprovePreCheckout { query_id } => {
            bot.answer_pre_checkout_query(teloxide::types::PreCheckoutQueryId(query_id), true)
                .await
                .context("answerPreCheckoutQuery call failed")?;
        }
    }

    Ok(())
}

fn keyboard_rows(buttons: Vec<String>) -> Vec<Vec<KeyboardButton>> {
    buttons
        .into_iter()
        .map(|label| vec![KeyboardButton::new(label)])
        .collect()
}

fn invoice_prices(subtotal: u32) -> Vec<LabeledPrice> {
    vec![LabeledPrice {
        label: "Sub Total".to_string(),
        amount: subtotal,
    }]
}
