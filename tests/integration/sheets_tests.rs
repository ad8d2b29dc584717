use super::*;
use serde_json::{Value, json};
use shelfwatch::store::SheetsClient;
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PRIVATE_KEY: &str = include_str!("../fixtures/test_service_account_key.pem");
const VALUES_PATH: &str = "/v4/spreadsheets/sheet-123/values/Sheet2";
const BATCH_PATH: &str = "/v4/spreadsheets/sheet-123/values:batchUpdate";

fn write_credentials(dir: &Path, server_uri: &str) -> anyhow::Result<String> {
    let key = json!({
        "type": "service_account",
        "client_email": "shelfwatch@test-project.iam.gserviceaccount.com",
        "private_key_id": "test-key",
        "private_key": PRIVATE_KEY,
        "token_uri": format!("{}/token", server_uri),
    });
    let path = dir.join("service_account.json");
    std::fs::write(&path, serde_json::to_string(&key)?)?;
    Ok(path.to_string_lossy().into_owned())
}

async fn mount_token(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=urn%3Aietf%3Aparams%3Aoauth%3Agrant-type%3Ajwt-bearer"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "ya29.test-token",
            "expires_in": 3600,
            "token_type": "Bearer",
        })))
        .mount(server)
        .await;
}

fn sheet_values() -> Value {
    json!({
        "range": "Sheet2!A1:H4",
        "majorDimension": "ROWS",
        "values": [
            ["ShopA_ID", "Title", "Name", "Category", "ShopA_Price", "ShopA_Stock", "ShopB_Link", "ShopB_Price"],
            ["A1", "Ryzen 7", "پردازنده", "CPU", "1,500,000", "1", "https://shopb.example/p/1", "1490000"],
            ["A2", "", "", "GPU", "", "0", "-"],
            ["", "Orphan", "", "RAM"],
        ]
    })
}

async fn connect(server: &MockServer, dir: &TempDir) -> anyhow::Result<SheetsClient> {
    let mut config = get_test_config(&server.uri());
    config.sheets.credentials_path = write_credentials(dir.path(), &server.uri())?;
    Ok(SheetsClient::connect(&config.sheets).await?)
}

#[tokio::test]
async fn test_fetch_rows_in_sheet_order() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    let dir = TempDir::new()?;
    mount_token(&server).await;
    Mock::given(method("GET"))
        .and(path(VALUES_PATH))
        .and(header("authorization", "Bearer ya29.test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sheet_values()))
        .expect(1)
        .mount(&server)
        .await;

    let mut client = connect(&server, &dir).await?;
    let rows = client.fetch_all_rows().await?;

    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].position, 2);
    assert_eq!(rows[0].identifier, "A1");
    assert_eq!(rows[0].price_a, Some(price(1_500_000)));
    assert_eq!(rows[0].stock_a, StockStatus::InStock);
    assert_eq!(rows[0].price_b, Some(price(1_490_000)));
    assert_eq!(rows[1].stock_a, StockStatus::OutOfStock);
    assert_eq!(rows[1].shop_b_link(), None);
    assert_eq!(rows[1].price_b, None);
    assert!(!rows[2].is_trackable());
    assert_eq!(rows[2].position, 4);
    Ok(())
}

#[tokio::test]
async fn test_missing_required_column_is_schema_error() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    let dir = TempDir::new()?;
    mount_token(&server).await;
    Mock::given(method("GET"))
        .and(path(VALUES_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "values": [["ShopA_ID", "Category", "ShopA_Price", "ShopA_Stock", "ShopB_Link"]]
        })))
        .mount(&server)
        .await;

    let mut client = connect(&server, &dir).await?;
    let result = client.fetch_all_rows().await;

    assert!(matches!(result, Err(AppError::Schema { column }) if column == "ShopB_Price"));
    Ok(())
}

#[tokio::test]
async fn test_batch_update_round_trip() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    let dir = TempDir::new()?;
    mount_token(&server).await;
    Mock::given(method("GET"))
        .and(path(VALUES_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(sheet_values()))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(BATCH_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "totalUpdatedCells": 4 })))
        .expect(1)
        .mount(&server)
        .await;

    let mut client = connect(&server, &dir).await?;
    let mut rows = client.fetch_all_rows().await?;
    rows[0].price_a = Some(price(1_450_000));
    rows[0].stock_a = StockStatus::OutOfStock;
    rows[1].stock_a = StockStatus::InStock;
    let written = client.batch_update(&rows[..2]).await?;
    assert_eq!(written, 4);

    let requests = server.received_requests().await.unwrap_or_default();
    let batch = requests
        .iter()
        .find(|r| r.url.path() == BATCH_PATH)
        .ok_or_else(|| anyhow::anyhow!("no batch update request"))?;
    let body: Value = serde_json::from_slice(&batch.body)?;
    assert_eq!(body["valueInputOption"], "USER_ENTERED");

    let cells: Vec<(String, String)> = body["data"]
        .as_array()
        .map(|data| {
            data.iter()
                .map(|d| {
                    (
                        d["range"].as_str().unwrap_or_default().to_string(),
                        d["values"][0][0].as_str().unwrap_or_default().to_string(),
                    )
                })
                .collect()
        })
        .unwrap_or_default();
    assert_eq!(
        cells,
        vec![
            ("'Sheet2'!H2".to_string(), "1490000".to_string()),
            ("'Sheet2'!E2".to_string(), "1450000".to_string()),
            ("'Sheet2'!F2".to_string(), "0".to_string()),
            ("'Sheet2'!F3".to_string(), "1".to_string()),
        ]
    );

    // Re-reading the written cells yields the same values.
    let grid: Vec<Vec<String>> = vec![
        ["ShopA_ID", "Title", "Name", "Category", "ShopA_Price", "ShopA_Stock", "ShopB_Link", "ShopB_Price"]
            .map(String::from)
            .to_vec(),
        ["A1", "Ryzen 7", "پردازنده", "CPU", "1450000", "0", "https://shopb.example/p/1", "1490000"]
            .map(String::from)
            .to_vec(),
    ];
    let (_, reread) = shelfwatch::store::rows_from_grid(&grid, &Default::default())?;
    assert_eq!(reread[0], rows[0]);
    Ok(())
}

#[tokio::test]
async fn test_rate_limited_fetch_is_retried() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    let dir = TempDir::new()?;
    mount_token(&server).await;
    Mock::given(method("GET"))
        .and(path(VALUES_PATH))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "error": { "code": 429, "status": "RESOURCE_EXHAUSTED", "message": "Quota exceeded for quota metric" }
        })))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(VALUES_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(sheet_values()))
        .expect(1)
        .mount(&server)
        .await;

    let mut client = connect(&server, &dir).await?;
    let rows = client.fetch_all_rows().await?;

    assert_eq!(rows.len(), 3);
    Ok(())
}

#[tokio::test]
async fn test_other_store_errors_fail_immediately() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    let dir = TempDir::new()?;
    mount_token(&server).await;
    Mock::given(method("GET"))
        .and(path(VALUES_PATH))
        .respond_with(ResponseTemplate::new(403).set_body_string("PERMISSION_DENIED"))
        .expect(1)
        .mount(&server)
        .await;

    let mut client = connect(&server, &dir).await?;
    let result = client.fetch_all_rows().await;

    assert!(matches!(result, Err(AppError::HttpStatus { status: 403, .. })));
    Ok(())
}

#[tokio::test]
async fn test_empty_update_makes_no_request() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    let dir = TempDir::new()?;
    mount_token(&server).await;
    Mock::given(method("GET"))
        .and(path(VALUES_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(sheet_values()))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(BATCH_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut client = connect(&server, &dir).await?;
    let rows = client.fetch_all_rows().await?;

    assert_eq!(client.batch_update(&[]).await?, 0);
    // A row with nothing known writes no cells either.
    assert_eq!(client.batch_update(&rows[2..]).await?, 0);
    Ok(())
}

#[tokio::test]
async fn test_rejected_credentials_are_auth_error() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    let dir = TempDir::new()?;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(400).set_body_string(r#"{"error":"invalid_grant"}"#))
        .mount(&server)
        .await;

    let result = connect(&server, &dir).await;

    let err = result.err().ok_or_else(|| anyhow::anyhow!("connect should fail"))?;
    assert!(matches!(err.downcast_ref::<AppError>(), Some(AppError::Auth(_))));
    Ok(())
}
