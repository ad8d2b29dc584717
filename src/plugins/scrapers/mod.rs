// Shop scrapers
pub mod fetcher;
pub mod shop_a;
pub mod shop_b;

pub use fetcher::PageFetcher;
pub use shop_a::ShopAScraper;
pub use shop_b::ShopBScraper;

use scraper::{ElementRef, Selector};

use crate::utils::error::{AppError, Result};

fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector)
        .map_err(|e| AppError::Validation(format!("Invalid CSS selector '{}': {:?}", selector, e)))
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<Vec<_>>().join(" ").trim().to_string()
}
