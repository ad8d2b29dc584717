use std::future::Future;
use std::time::Duration;

use tracing::info;

use crate::config::{AppConfig, RunConfig};
use crate::plugins::notifiers::TelegramNotifier;
use crate::plugins::scrapers::{PageFetcher, ShopAScraper, ShopBScraper};
use crate::reconciler::{Reconciler, RunSummary};
use crate::store::sheets::SheetsClient;
use crate::utils::error::Result;
use crate::utils::retry::RetryPolicy;

/// One full pass with fresh clients. The sheet session lives only as long as
/// this call.
pub async fn run_once(config: &AppConfig) -> Result<RunSummary> {
    let store = SheetsClient::connect(&config.sheets).await?;
    let fetcher = PageFetcher::new(&config.scraper)?;
    let shop_a = ShopAScraper::new(fetcher.clone(), &config.shop_a)?;
    let shop_b = ShopBScraper::new(fetcher, &config.shop_b)?;
    let notifier = TelegramNotifier::new(&config.telegram)?;

    let mut reconciler = Reconciler::new(store, shop_a, shop_b, notifier, &config.alerts.currency_label);
    reconciler.run().await
}

pub async fn run_with_retries<F, Fut>(config: &RunConfig, run: F) -> Result<RunSummary>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<RunSummary>>,
{
    let delay = Duration::from_secs(config.retry_delay_secs);
    run_with_policy(RetryPolicy::new(config.max_attempts, delay, delay, |_| true), run).await
}

async fn run_with_policy<F, Fut>(policy: RetryPolicy, run: F) -> Result<RunSummary>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<RunSummary>>,
{
    info!(max_attempts = policy.max_attempts(), "Starting reconciliation run");
    policy.run("reconciliation run", run).await
}
