use super::*;
use shelfwatch::plugins::scrapers::{PageFetcher, ShopAScraper, ShopBScraper};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SHOP_A_IN_STOCK: &str = r#"<html><body>
<b class="text-primary">موجود</b>
<strong class="text-success font-size-large font-weight-bold mt-2">۱,۲۵۰,۰۰۰ تومان</strong>
</body></html>"#;

const SHOP_A_SOLD_OUT: &str = r#"<html><body>
<b class="text-primary">ناموجود</b>
</body></html>"#;

const SHOP_B_PAGE: &str = r#"<html><body>
<div class="Showcase_buy_box_text__otYW_">فروشنده</div>
<div class="Showcase_buy_box_text__otYW_">۹۸۰,۰۰۰ تومان</div>
</body></html>"#;

fn shop_a(config: &AppConfig) -> anyhow::Result<ShopAScraper> {
    let fetcher = PageFetcher::new(&config.scraper)?;
    Ok(ShopAScraper::new(fetcher, &config.shop_a)?)
}

fn shop_b(config: &AppConfig) -> anyhow::Result<ShopBScraper> {
    let fetcher = PageFetcher::new(&config.scraper)?;
    Ok(ShopBScraper::new(fetcher, &config.shop_b)?)
}

#[tokio::test]
async fn test_shop_a_page_parsed() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/single-product.php"))
        .and(query_param("id", "A1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(SHOP_A_IN_STOCK))
        .expect(1)
        .mount(&server)
        .await;

    let config = get_test_config(&server.uri());
    let outcome = shop_a(&config)?.scrape("A1").await?;

    assert_eq!(
        outcome,
        ScrapeOutcome::Found(Listing {
            price: Some(price(1_250_000)),
            stock: StockStatus::InStock,
        })
    );
    Ok(())
}

#[tokio::test]
async fn test_shop_a_sold_out_without_price() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/single-product.php"))
        .respond_with(ResponseTemplate::new(200).set_body_string(SHOP_A_SOLD_OUT))
        .mount(&server)
        .await;

    let config = get_test_config(&server.uri());
    let outcome = shop_a(&config)?.scrape("A2").await?;

    assert_eq!(
        outcome,
        ScrapeOutcome::Found(Listing {
            price: None,
            stock: StockStatus::OutOfStock,
        })
    );
    Ok(())
}

#[tokio::test]
async fn test_transient_failures_are_retried() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/single-product.php"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/single-product.php"))
        .respond_with(ResponseTemplate::new(200).set_body_string(SHOP_A_IN_STOCK))
        .expect(1)
        .mount(&server)
        .await;

    let config = get_test_config(&server.uri());
    let outcome = shop_a(&config)?.scrape("A1").await?;

    assert!(matches!(outcome, ScrapeOutcome::Found(Listing { price: Some(_), .. })));
    Ok(())
}

#[tokio::test]
async fn test_retry_exhaustion_is_an_error() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/single-product.php"))
        .respond_with(ResponseTemplate::new(503))
        .expect(4)
        .mount(&server)
        .await;

    let config = get_test_config(&server.uri());
    let result = shop_a(&config)?.scrape("A1").await;

    assert!(matches!(result, Err(AppError::HttpStatus { status: 503, .. })));
    Ok(())
}

#[tokio::test]
async fn test_client_errors_are_not_retried() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/single-product.php"))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&server)
        .await;

    let config = get_test_config(&server.uri());
    let result = shop_a(&config)?.scrape("A1").await;

    assert!(matches!(result, Err(AppError::HttpStatus { status: 403, .. })));
    Ok(())
}

#[tokio::test]
async fn test_missing_page_is_not_found() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/product/gone"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let config = get_test_config(&server.uri());
    let outcome = shop_b(&config)?.scrape(&format!("{}/product/gone", server.uri())).await?;

    assert_eq!(outcome, ScrapeOutcome::NotFound);
    Ok(())
}

#[tokio::test]
async fn test_shop_b_second_container_price() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/product/dkp-1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(SHOP_B_PAGE))
        .mount(&server)
        .await;

    let config = get_test_config(&server.uri());
    let outcome = shop_b(&config)?.scrape(&format!("{}/product/dkp-1", server.uri())).await?;

    assert_eq!(
        outcome,
        ScrapeOutcome::Found(Listing {
            price: Some(price(980_000)),
            stock: StockStatus::Unknown,
        })
    );
    Ok(())
}

#[tokio::test]
async fn test_shop_b_invalid_link_is_rejected() -> anyhow::Result<()> {
    let config = get_test_config("http://127.0.0.1:9");
    let result = shop_b(&config)?.scrape("not a url").await;

    assert!(matches!(result, Err(AppError::Validation(_))));
    Ok(())
}
