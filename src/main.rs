use anyhow::{Context, Result};
use shelfwatch::{AppConfig, logging, runner};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env().context("loading configuration")?;
    let _guard = logging::init(&config.logging)?;

    info!(
        worksheet = %config.sheets.worksheet,
        spreadsheet = %config.sheets.spreadsheet_url,
        "Starting Shelfwatch..."
    );

    match runner::run_with_retries(&config.run, || runner::run_once(&config)).await {
        Ok(summary) => {
            info!(
                rows = summary.rows_seen,
                processed = summary.rows_processed,
                skipped = summary.rows_skipped,
                failures = summary.scrape_failures,
                cells = summary.cells_written,
                alerts = summary.divergence_alerts,
                out_of_stock = summary.out_of_stock,
                summary_sent = summary.out_of_stock_summary_sent,
                "Update complete"
            );
            Ok(())
        }
        Err(e) => {
            error!(error = %e, attempts = config.run.max_attempts, "All attempts failed");
            Err(e.into())
        }
    }
}
