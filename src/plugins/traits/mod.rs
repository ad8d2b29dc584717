pub mod notifier;
pub mod scraper;

pub use notifier::{DeliveryReport, Notifier};
pub use scraper::{Listing, ScrapeOutcome, Scraper};
