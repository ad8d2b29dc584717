use serde::{Deserialize, Serialize};
use std::fmt;

pub mod price_comparison;
pub mod product_row;

// Re-exports for convenience
pub use price_comparison::*;
pub use product_row::*;

/// Availability reported by Shop A.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    InStock,
    OutOfStock,
    #[default]
    Unknown,
}

impl StockStatus {
    /// Sheet cells hold `1` for in stock and `0` for out of stock.
    pub fn from_cell(cell: &str) -> Self {
        match cell.trim() {
            "1" => StockStatus::InStock,
            "0" => StockStatus::OutOfStock,
            _ => StockStatus::Unknown,
        }
    }

    /// `None` for unknown stock, which is never written back.
    pub fn to_cell(self) -> Option<&'static str> {
        match self {
            StockStatus::InStock => Some("1"),
            StockStatus::OutOfStock => Some("0"),
            StockStatus::Unknown => None,
        }
    }

    pub fn is_known(self) -> bool {
        self != StockStatus::Unknown
    }
}

impl fmt::Display for StockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            StockStatus::InStock => "In Stock",
            StockStatus::OutOfStock => "Out of Stock",
            StockStatus::Unknown => "Unknown",
        };
        f.write_str(label)
    }
}
