use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::alerts::{OutOfStockEntry, out_of_stock_summary, price_divergence_message};
use crate::models::{StockStatus, is_divergent};
use crate::plugins::traits::{Notifier, ScrapeOutcome, Scraper};
use crate::store::RowStore;
use crate::utils::error::Result;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunSummary {
    pub rows_seen: usize,
    pub rows_processed: usize,
    pub rows_skipped: usize,
    pub rows_updated: usize,
    pub cells_written: usize,
    pub scrape_failures: usize,
    pub divergence_alerts: usize,
    pub out_of_stock: usize,
    pub out_of_stock_summary_sent: bool,
}

/// Walks every sheet row once: scrapes both shops, writes the fresh values
/// back in one batch and sends the alerts the new values call for.
pub struct Reconciler<S, A, B, N> {
    store: S,
    shop_a: A,
    shop_b: B,
    notifier: N,
    currency_label: String,
}

impl<S, A, B, N> Reconciler<S, A, B, N>
where
    S: RowStore,
    A: Scraper,
    B: Scraper,
    N: Notifier,
{
    pub fn new(store: S, shop_a: A, shop_b: B, notifier: N, currency_label: impl Into<String>) -> Self {
        Self {
            store,
            shop_a,
            shop_b,
            notifier,
            currency_label: currency_label.into(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn scrapers(&self) -> (&A, &B) {
        (&self.shop_a, &self.shop_b)
    }

    /// Only a failing row store aborts the run. Scrape and delivery failures
    /// are logged and leave the affected cells as they were.
    pub async fn run(&mut self) -> Result<RunSummary> {
        info!("Starting price and stock update");
        let rows = self.store.fetch_all_rows().await?;
        let total = rows.len();

        let mut summary = RunSummary {
            rows_seen: total,
            ..Default::default()
        };
        let mut refreshed_rows = Vec::new();
        let mut out_of_stock = Vec::new();

        for (index, mut row) in rows.into_iter().enumerate() {
            info!(product = index + 1, total, "Processing product");

            if !row.is_trackable() {
                warn!(row = row.position, "Skipping row: missing identifier or category");
                summary.rows_skipped += 1;
                continue;
            }
            summary.rows_processed += 1;

            let mut refreshed = false;
            let mut fresh_price_b = None;
            let mut fresh_price_a = None;

            if let Some(link) = row.shop_b_link().map(str::to_owned) {
                match self.shop_b.scrape(&link).await {
                    Ok(ScrapeOutcome::Found(listing)) => {
                        if let Some(price) = listing.price {
                            row.price_b = Some(price);
                            fresh_price_b = Some(price);
                            refreshed = true;
                        }
                    }
                    Ok(ScrapeOutcome::NotFound) => {
                        info!(product_id = %row.identifier, "No Shop B listing");
                    }
                    Err(e) => {
                        error!(
                            shop = self.shop_b.shop_name(),
                            product_id = %row.identifier,
                            error = %e,
                            "Scrape failed, keeping previous values"
                        );
                        summary.scrape_failures += 1;
                    }
                }
            }

            match self.shop_a.scrape(&row.identifier).await {
                Ok(ScrapeOutcome::Found(listing)) => {
                    if let Some(price) = listing.price {
                        row.price_a = Some(price);
                        fresh_price_a = Some(price);
                        refreshed = true;
                    }
                    if listing.stock.is_known() {
                        row.stock_a = listing.stock;
                        refreshed = true;
                    }
                    if listing.stock == StockStatus::OutOfStock {
                        info!(product_id = %row.identifier, "Product is out of stock");
                        out_of_stock.push(OutOfStockEntry::from(&row));
                    }
                }
                Ok(ScrapeOutcome::NotFound) => {
                    info!(product_id = %row.identifier, "No Shop A listing");
                }
                Err(e) => {
                    error!(
                        shop = self.shop_a.shop_name(),
                        product_id = %row.identifier,
                        error = %e,
                        "Scrape failed, keeping previous values"
                    );
                    summary.scrape_failures += 1;
                }
            }

            // Only prices seen in this run can raise an alert.
            if let (Some(price_a), Some(price_b)) = (fresh_price_a, fresh_price_b) {
                if is_divergent(price_a, price_b) {
                    info!(product_id = %row.identifier, %price_a, %price_b, "Price difference alert");
                    let message = price_divergence_message(&row, price_a, price_b, &self.currency_label);
                    let report = self.notifier.notify(&row.category, &message).await;
                    if !report.all_delivered() {
                        warn!(
                            product_id = %row.identifier,
                            delivered = report.delivered,
                            failed = report.failed,
                            "Price alert only partly delivered"
                        );
                    }
                    summary.divergence_alerts += 1;
                }
            }

            if refreshed {
                refreshed_rows.push(row);
            }
        }

        summary.rows_updated = refreshed_rows.len();
        summary.cells_written = self.store.batch_update(&refreshed_rows).await?;

        summary.out_of_stock = out_of_stock.len();
        if let Some(stock_summary) = out_of_stock_summary(&out_of_stock) {
            info!(products = out_of_stock.len(), "Sending out-of-stock summary");
            let report = self.notifier.broadcast(&stock_summary).await;
            info!(delivered = report.delivered, failed = report.failed, "Out-of-stock summary sent");
            summary.out_of_stock_summary_sent = true;
        } else if !out_of_stock.is_empty() {
            info!(products = out_of_stock.len(), "Out-of-stock count below summary threshold");
        }

        info!(?summary, "Price and stock update finished");
        Ok(summary)
    }
}
