use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::StockStatus;
use crate::utils::error::Result;

/// What a product page said about the product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    pub price: Option<Decimal>,
    pub stock: StockStatus,
}

/// Result of a successful fetch. Transient failures that outlive the retry
/// budget are reported through the surrounding `Result` instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScrapeOutcome {
    Found(Listing),
    /// The shop has no listing for the product. Not an error.
    NotFound,
}

/// Looks up one product on one shop.
#[async_trait]
pub trait Scraper: Send + Sync {
    fn shop_name(&self) -> &str;

    /// `key` is the product identifier or page URL, depending on the shop.
    async fn scrape(&self, key: &str) -> Result<ScrapeOutcome>;
}
