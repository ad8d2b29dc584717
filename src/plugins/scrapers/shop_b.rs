use async_trait::async_trait;
use scraper::{Html, Selector};
use tracing::{info, warn};
use url::Url;

use super::{PageFetcher, element_text, parse_selector};
use crate::config::ShopBConfig;
use crate::models::StockStatus;
use crate::plugins::traits::{Listing, ScrapeOutcome, Scraper};
use crate::utils::error::{AppError, Result};
use crate::utils::text::parse_price_digits;

/// Reads the price from a Shop B showcase page. Shop B has no stock info.
#[derive(Debug, Clone)]
pub struct ShopBParser {
    price_selector: Selector,
    price_index: usize,
    currency_marker: String,
}

impl ShopBParser {
    pub fn new(config: &ShopBConfig) -> Result<Self> {
        Ok(Self {
            price_selector: parse_selector(&config.price_selector)?,
            price_index: config.price_index,
            currency_marker: config.currency_marker.clone(),
        })
    }

    pub fn parse(&self, html: &str) -> Result<ScrapeOutcome> {
        let document = Html::parse_document(html);

        let Some(container) = document.select(&self.price_selector).nth(self.price_index) else {
            return Ok(ScrapeOutcome::NotFound);
        };
        let text = element_text(container);
        let Some((amount, _)) = text.split_once(&self.currency_marker) else {
            return Ok(ScrapeOutcome::NotFound);
        };

        let price = parse_price_digits(amount)
            .ok_or_else(|| AppError::parse(format!("price container has no digits: {:?}", text)))?;

        Ok(ScrapeOutcome::Found(Listing {
            price: Some(price),
            stock: StockStatus::Unknown,
        }))
    }
}

pub struct ShopBScraper {
    fetcher: PageFetcher,
    parser: ShopBParser,
}

impl ShopBScraper {
    pub fn new(fetcher: PageFetcher, config: &ShopBConfig) -> Result<Self> {
        Ok(Self {
            fetcher,
            parser: ShopBParser::new(config)?,
        })
    }
}

#[async_trait]
impl Scraper for ShopBScraper {
    fn shop_name(&self) -> &str {
        "shop_b"
    }

    async fn scrape(&self, link: &str) -> Result<ScrapeOutcome> {
        // A malformed link will never succeed, so it is not worth a retry.
        Url::parse(link).map_err(|e| AppError::Validation(format!("invalid Shop B link '{}': {}", link, e)))?;
        info!(link, "Fetching Shop B product page");

        let outcome = self
            .fetcher
            .fetch_and_parse("shop_b", link, |body| self.parser.parse(body))
            .await?;

        match &outcome {
            ScrapeOutcome::Found(listing) => info!(link, price = ?listing.price, "Shop B listing"),
            ScrapeOutcome::NotFound => warn!(link, "Price element not found on Shop B page"),
        }
        Ok(outcome)
    }
}
