use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::alerts::OutOfStockSummary;
use crate::config::TelegramConfig;
use crate::plugins::traits::{DeliveryReport, Notifier};
use crate::utils::error::{AppError, Result};
use crate::utils::retry::RetryPolicy;

const SEND_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Sends HTML messages through the Telegram bot API, one request per chat.
pub struct TelegramNotifier {
    client: Client,
    send_url: String,
    recipients: BTreeMap<String, Vec<String>>,
    retry: RetryPolicy,
}

impl TelegramNotifier {
    pub fn new(config: &TelegramConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(SEND_TIMEOUT_SECS))
            .build()?;
        let send_url = format!(
            "{}/bot{}/sendMessage",
            config.api_base_url.trim_end_matches('/'),
            config.bot_token
        );
        info!(recipients = config.recipients.len(), "Telegram notifier initialized");

        Ok(Self {
            client,
            send_url,
            recipients: config.recipients.clone(),
            retry: RetryPolicy::from_config(&config.retry, AppError::is_rate_limited),
        })
    }

    /// Chats subscribed to at least one of `categories`, each listed once.
    pub fn recipients_for<'a>(&'a self, categories: &[String]) -> Vec<&'a str> {
        self.recipients
            .iter()
            .filter(|(_, subscribed)| {
                subscribed
                    .iter()
                    .any(|s| categories.iter().any(|c| c.trim() == s.trim()))
            })
            .map(|(chat_id, _)| chat_id.as_str())
            .collect()
    }

    async fn send(&self, chat_id: &str, message: &str) -> Result<()> {
        let response = self
            .client
            .post(&self.send_url)
            .form(&[("chat_id", chat_id), ("text", message), ("parse_mode", "HTML")])
            .send()
            .await
            .map_err(|e| AppError::Http(e.without_url()))?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(AppError::RateLimited {
                service: "telegram".to_string(),
                message: response.text().await.unwrap_or_default(),
            });
        }
        // The request URL embeds the bot token, so it stays out of errors.
        if !status.is_success() {
            return Err(AppError::HttpStatus {
                status: status.as_u16(),
                url: "telegram sendMessage".to_string(),
            });
        }

        let body: ApiResponse = response
            .json()
            .await
            .map_err(|e| AppError::Http(e.without_url()))?;
        if !body.ok {
            return Err(AppError::Validation(format!(
                "telegram rejected message: {}",
                body.description.unwrap_or_default()
            )));
        }
        Ok(())
    }

    async fn deliver_one(&self, chat_id: &str, message: &str, report: &mut DeliveryReport) {
        match self
            .retry
            .run("telegram.send", || self.send(chat_id, message))
            .await
        {
            Ok(()) => {
                info!(chat_id, "Message sent");
                report.delivered += 1;
            }
            Err(e) => {
                error!(chat_id, error = %e, "Failed to send Telegram message");
                report.failed += 1;
            }
        }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, category: &str, message: &str) -> DeliveryReport {
        let chat_ids = self.recipients_for(&[category.to_string()]);
        if chat_ids.is_empty() {
            warn!(category, "No recipients subscribed to category");
        }
        let mut report = DeliveryReport::default();
        for chat_id in chat_ids {
            self.deliver_one(chat_id, message, &mut report).await;
        }
        report
    }

    async fn broadcast(&self, summary: &OutOfStockSummary) -> DeliveryReport {
        let mut report = DeliveryReport::default();
        for (chat_id, subscribed) in &self.recipients {
            if let Some(message) = summary.message_for(subscribed) {
                self.deliver_one(chat_id, &message, &mut report).await;
            }
        }
        if report.recipients() == 0 {
            warn!(categories = ?summary.categories(), "No recipients subscribed to any category");
        }
        report
    }
}
