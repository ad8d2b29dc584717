use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::StockStatus;

/// One product as stored in the spreadsheet.
///
/// `position` is the 1-based sheet row the product was read from; writes go
/// back to that row, so rows must keep the order the store returned them in.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProductRow {
    pub position: usize,
    pub identifier: String,
    pub title: String,
    pub name: String,
    pub category: String,
    pub price_a: Option<Decimal>,
    pub stock_a: StockStatus,
    pub link_b: String,
    pub price_b: Option<Decimal>,
}

impl ProductRow {
    /// Rows without an identifier or category cannot be scraped or routed.
    pub fn is_trackable(&self) -> bool {
        !self.identifier.trim().is_empty() && !self.category.trim().is_empty()
    }

    /// An empty cell or `-` means the product has no Shop B listing.
    pub fn shop_b_link(&self) -> Option<&str> {
        match self.link_b.trim() {
            "" | "-" => None,
            link => Some(link),
        }
    }

    pub fn display_name(&self) -> &str {
        [&self.name, &self.title, &self.identifier]
            .into_iter()
            .map(|s| s.trim())
            .find(|s| !s.is_empty())
            .unwrap_or_default()
    }
}
