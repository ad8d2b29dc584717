use async_trait::async_trait;
use scraper::{Html, Selector};
use tracing::{info, warn};

use super::{PageFetcher, element_text, parse_selector};
use crate::config::ShopAConfig;
use crate::models::StockStatus;
use crate::plugins::traits::{Listing, ScrapeOutcome, Scraper};
use crate::utils::error::{AppError, Result};
use crate::utils::text::parse_price_digits;

/// Reads price and stock from a Shop A product page.
#[derive(Debug, Clone)]
pub struct ShopAParser {
    stock_selector: Selector,
    price_selector: Selector,
    out_of_stock_marker: String,
    currency_marker: String,
}

impl ShopAParser {
    pub fn new(config: &ShopAConfig) -> Result<Self> {
        Ok(Self {
            stock_selector: parse_selector(&config.stock_selector)?,
            price_selector: parse_selector(&config.price_selector)?,
            out_of_stock_marker: config.out_of_stock_marker.clone(),
            currency_marker: config.currency_marker.clone(),
        })
    }

    /// A page without the stock badge has no listing. A badge without a
    /// price is still a listing, just one with an unknown price.
    pub fn parse(&self, html: &str) -> Result<ScrapeOutcome> {
        let document = Html::parse_document(html);

        let Some(badge) = document.select(&self.stock_selector).next() else {
            return Ok(ScrapeOutcome::NotFound);
        };
        let stock = if element_text(badge).contains(&self.out_of_stock_marker) {
            StockStatus::OutOfStock
        } else {
            StockStatus::InStock
        };

        let price = match document.select(&self.price_selector).next() {
            None => None,
            Some(element) => {
                let text = element_text(element);
                match text.split_once(&self.currency_marker) {
                    // Prices without the currency word are "call us" style placeholders.
                    None => None,
                    Some((amount, _)) => Some(parse_price_digits(amount).ok_or_else(|| {
                        AppError::parse(format!("price element has no digits: {:?}", text))
                    })?),
                }
            }
        };

        Ok(ScrapeOutcome::Found(Listing { price, stock }))
    }
}

pub struct ShopAScraper {
    fetcher: PageFetcher,
    parser: ShopAParser,
    url_template: String,
}

impl ShopAScraper {
    pub fn new(fetcher: PageFetcher, config: &ShopAConfig) -> Result<Self> {
        Ok(Self {
            fetcher,
            parser: ShopAParser::new(config)?,
            url_template: config.product_url_template.clone(),
        })
    }

    pub fn product_url(&self, product_id: &str) -> String {
        let encoded: String = url::form_urlencoded::byte_serialize(product_id.trim().as_bytes()).collect();
        self.url_template.replace("{id}", &encoded)
    }
}

#[async_trait]
impl Scraper for ShopAScraper {
    fn shop_name(&self) -> &str {
        "shop_a"
    }

    async fn scrape(&self, product_id: &str) -> Result<ScrapeOutcome> {
        let url = self.product_url(product_id);
        info!(product_id, "Fetching Shop A product page");

        let outcome = self
            .fetcher
            .fetch_and_parse("shop_a", &url, |body| self.parser.parse(body))
            .await?;

        match &outcome {
            ScrapeOutcome::Found(listing) => {
                if listing.price.is_none() {
                    warn!(%url, "Price element not found on Shop A page");
                }
                info!(product_id, price = ?listing.price, stock = %listing.stock, "Shop A listing");
            }
            ScrapeOutcome::NotFound => warn!(%url, "Stock status not found on Shop A page"),
        }
        Ok(outcome)
    }
}
