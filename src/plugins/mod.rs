pub mod notifiers;
pub mod scrapers;
pub mod traits;

pub use traits::{Notifier, Scraper};
