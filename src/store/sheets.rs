use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{info, warn};
use url::Url;

use super::auth::{ServiceAccountKey, request_access_token};
use super::{ColumnMap, RowStore, rows_from_grid, spreadsheet_id_from_url};
use crate::config::{ColumnNames, SheetsConfig};
use crate::models::ProductRow;
use crate::utils::error::{AppError, Result};
use crate::utils::retry::RetryPolicy;

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

/// One authenticated session against a single worksheet.
///
/// The bearer token is obtained in [`SheetsClient::connect`] and lives as
/// long as the client, which is one reconciliation run.
pub struct SheetsClient {
    http: Client,
    api_base_url: Url,
    spreadsheet_id: String,
    worksheet: String,
    column_names: ColumnNames,
    access_token: String,
    retry: RetryPolicy,
    columns: Option<ColumnMap>,
}

impl SheetsClient {
    pub async fn connect(config: &SheetsConfig) -> Result<Self> {
        let key = ServiceAccountKey::from_file(&config.credentials_path)?;
        let spreadsheet_id = spreadsheet_id_from_url(&config.spreadsheet_url).ok_or_else(|| {
            AppError::Validation(format!("no spreadsheet id in {}", config.spreadsheet_url))
        })?;
        let api_base_url = Url::parse(&config.api_base_url)
            .map_err(|e| AppError::Validation(format!("invalid sheets API URL: {}", e)))?;

        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout))
            .build()?;
        let retry = RetryPolicy::from_config(&config.retry, AppError::is_rate_limited);

        let access_token = retry
            .run("sheets.auth", || request_access_token(&http, &key))
            .await?;
        info!(
            spreadsheet = %spreadsheet_id,
            worksheet = %config.worksheet,
            account = %key.client_email,
            "Connected to spreadsheet"
        );

        Ok(Self {
            http,
            api_base_url,
            spreadsheet_id,
            worksheet: config.worksheet.clone(),
            column_names: config.columns.clone(),
            access_token,
            retry,
            columns: None,
        })
    }

    fn endpoint(&self, tail: &[&str]) -> Result<Url> {
        let mut url = self.api_base_url.clone();
        url.path_segments_mut()
            .map_err(|_| AppError::Validation("sheets API URL cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(["v4", "spreadsheets", self.spreadsheet_id.as_str()])
            .extend(tail);
        Ok(url)
    }

    async fn get_values(&self) -> Result<Vec<Vec<String>>> {
        let url = self.endpoint(&["values", self.worksheet.as_str()])?;
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.access_token)
            .send()
            .await?;
        let range: ValueRange = check_response(response).await?.json().await?;
        Ok(range.values)
    }

    async fn post_batch(&self, body: &serde_json::Value) -> Result<()> {
        let url = self.endpoint(&["values:batchUpdate"])?;
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.access_token)
            .json(body)
            .send()
            .await?;
        check_response(response).await?;
        Ok(())
    }
}

/// Maps quota exhaustion to [`AppError::RateLimited`] and any other failure
/// status to [`AppError::HttpStatus`].
async fn check_response(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let url = response.url().to_string();
    let body = response.text().await.unwrap_or_default();
    if status.as_u16() == 429 || body.contains("Quota exceeded") || body.contains("RESOURCE_EXHAUSTED") {
        return Err(AppError::RateLimited {
            service: "sheets".to_string(),
            message: body,
        });
    }

    warn!(status = status.as_u16(), %url, body = %body, "Spreadsheet request failed");
    Err(AppError::HttpStatus {
        status: status.as_u16(),
        url,
    })
}

#[async_trait]
impl RowStore for SheetsClient {
    async fn fetch_all_rows(&mut self) -> Result<Vec<ProductRow>> {
        let grid = self.retry.run("sheets.fetch", || self.get_values()).await?;
        if grid.is_empty() {
            warn!(worksheet = %self.worksheet, "No data found in worksheet");
            return Ok(Vec::new());
        }

        let (columns, rows) = rows_from_grid(&grid, &self.column_names)?;
        info!(rows = rows.len(), worksheet = %self.worksheet, "Fetched worksheet rows");
        self.columns = Some(columns);
        Ok(rows)
    }

    async fn batch_update(&mut self, rows: &[ProductRow]) -> Result<usize> {
        let Some(columns) = self.columns.as_ref() else {
            if rows.is_empty() {
                return Ok(0);
            }
            return Err(AppError::Store(
                "batch_update called before the header was read".to_string(),
            ));
        };

        let data: Vec<serde_json::Value> = rows
            .iter()
            .flat_map(|row| columns.cell_updates(&self.worksheet, row))
            .map(|update| json!({ "range": update.range, "values": [[update.value]] }))
            .collect();

        if data.is_empty() {
            info!("No cell changes to write");
            return Ok(0);
        }

        let cells = data.len();
        let body = json!({
            "valueInputOption": "USER_ENTERED",
            "data": data,
        });

        info!(cells, rows = rows.len(), "Writing batch update");
        self.retry
            .run("sheets.batch_update", || self.post_batch(&body))
            .await?;
        info!(cells, "Batch update completed");
        Ok(cells)
    }
}
