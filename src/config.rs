use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use url::Url;

use crate::store::spreadsheet_id_from_url;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub sheets: SheetsConfig,
    pub telegram: TelegramConfig,
    pub shop_a: ShopAConfig,
    pub shop_b: ShopBConfig,
    pub scraper: ScraperConfig,
    pub alerts: AlertsConfig,
    pub run: RunConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetsConfig {
    pub credentials_path: String,
    pub spreadsheet_url: String,
    pub worksheet: String,
    pub api_base_url: String,
    pub request_timeout: u64,
    #[serde(default)]
    pub columns: ColumnNames,
    pub retry: RetryConfig,
}

/// Header names used to locate each column in the worksheet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ColumnNames {
    pub identifier: String,
    pub title: String,
    pub name: String,
    pub category: String,
    pub price_a: String,
    pub stock_a: String,
    pub link_b: String,
    pub price_b: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            identifier: "ShopA_ID".to_string(),
            title: "Title".to_string(),
            name: "Name".to_string(),
            category: "Category".to_string(),
            price_a: "ShopA_Price".to_string(),
            stock_a: "ShopA_Stock".to_string(),
            link_b: "ShopB_Link".to_string(),
            price_b: "ShopB_Price".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub api_base_url: String,
    /// Chat id -> categories that chat is subscribed to.
    #[serde(default)]
    pub recipients: BTreeMap<String, Vec<String>>,
    pub retry: RetryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShopAConfig {
    /// Product page URL with an `{id}` placeholder.
    pub product_url_template: String,
    pub stock_selector: String,
    pub out_of_stock_marker: String,
    pub price_selector: String,
    pub currency_marker: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShopBConfig {
    pub price_selector: String,
    /// Which of the matched containers holds the price.
    pub price_index: usize,
    pub currency_marker: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScraperConfig {
    pub user_agent: String,
    pub accept_language: String,
    pub connect_timeout: u64,
    pub request_timeout: u64,
    pub politeness_min_ms: u64,
    pub politeness_max_ms: u64,
    pub retry: RetryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertsConfig {
    pub currency_label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    pub max_attempts: u32,
    pub retry_delay_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub directory: String,
    pub file_prefix: String,
    pub filter: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let config_dir = env::var("SHELFWATCH_CONFIG_DIR").unwrap_or_else(|_| "config".into());
        Self::from_dir(&config_dir)
    }

    pub fn from_dir(config_dir: &str) -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "production".into());

        let s = Config::builder()
            // Start with default configuration
            .add_source(File::with_name(&format!("{}/default", config_dir)))
            // Add environment-specific config
            .add_source(File::with_name(&format!("{}/{}", config_dir, run_mode)).required(false))
            // Add local config (ignored by git)
            .add_source(File::with_name(&format!("{}/local", config_dir)).required(false))
            // Add environment variables with prefix "SHELFWATCH_"
            .add_source(Environment::with_prefix("SHELFWATCH").separator("__"))
            .build()?;

        let config: AppConfig = s.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sheets.credentials_path.trim().is_empty() {
            return Err(ConfigError::Message("sheets.credentials_path must be set".into()));
        }

        if spreadsheet_id_from_url(&self.sheets.spreadsheet_url).is_none() {
            return Err(ConfigError::Message(
                "sheets.spreadsheet_url must be a spreadsheet URL containing /d/<id>".into(),
            ));
        }

        if self.sheets.worksheet.trim().is_empty() {
            return Err(ConfigError::Message("sheets.worksheet must not be empty".into()));
        }

        if Url::parse(&self.sheets.api_base_url).is_err() {
            return Err(ConfigError::Message("Invalid sheets.api_base_url".into()));
        }

        if self.telegram.bot_token.trim().is_empty() {
            return Err(ConfigError::Message("telegram.bot_token must be set".into()));
        }

        if Url::parse(&self.telegram.api_base_url).is_err() {
            return Err(ConfigError::Message("Invalid telegram.api_base_url".into()));
        }

        if !self.shop_a.product_url_template.contains("{id}") {
            return Err(ConfigError::Message(
                "shop_a.product_url_template must contain an {id} placeholder".into(),
            ));
        }

        if self.scraper.politeness_min_ms > self.scraper.politeness_max_ms {
            return Err(ConfigError::Message(
                "scraper.politeness_min_ms cannot exceed politeness_max_ms".into(),
            ));
        }

        for (section, retry) in [
            ("sheets", &self.sheets.retry),
            ("scraper", &self.scraper.retry),
            ("telegram", &self.telegram.retry),
        ] {
            if retry.max_attempts == 0 {
                return Err(ConfigError::Message(format!(
                    "{}.retry.max_attempts must be greater than 0",
                    section
                )));
            }
            if retry.base_delay_ms > retry.max_delay_ms {
                return Err(ConfigError::Message(format!(
                    "{}.retry.base_delay_ms cannot exceed max_delay_ms",
                    section
                )));
            }
        }

        if self.run.max_attempts == 0 {
            return Err(ConfigError::Message("run.max_attempts must be greater than 0".into()));
        }

        Ok(())
    }
}
