mod common;

use std::time::Duration;

use pretty_assertions::assert_eq;
use shelf_core::ProductRecord;
use shelf_engine::{BrowserSession, FieldExtractor, FixtureSite, HtmlSession};
use tempfile::TempDir;

use common::{product_html, product_url, settings, ScriptedSession};

async fn extract_from(html: String) -> ProductRecord {
    let dir = TempDir::new().unwrap();
    let url = product_url("p-1");
    let mut session = HtmlSession::new(FixtureSite::new().page(&url, html));
    session.navigate(&url).await.unwrap();
    FieldExtractor::new(settings(dir.path()).extractor)
        .extract(&session, &url)
        .await
}

#[tokio::test]
async fn reads_every_field_group() {
    engine_logging::initialize_for_tests();
    let record = extract_from(product_html(
        Some("Wireless mouse M-1"),
        Some("1\u{2009}234\u{a0}₽"),
        Some("4.8 • 1 234 отзыва"),
    ))
    .await;

    assert_eq!(
        record,
        ProductRecord {
            url: product_url("p-1"),
            title: Some("Wireless mouse M-1".to_string()),
            price: Some(1234),
            rating: Some(4.8),
            reviews_count: Some(1234),
            is_seed: None,
        }
    );
}

#[tokio::test]
async fn missing_price_node_keeps_title_and_url() {
    let record = extract_from(product_html(Some("Mouse"), None, Some("4,5 • 10 отзывов"))).await;

    assert_eq!(record.url, product_url("p-1"));
    assert_eq!(record.title.as_deref(), Some("Mouse"));
    assert_eq!(record.price, None);
    assert_eq!(record.rating, Some(4.5));
    assert_eq!(record.reviews_count, Some(10));
}

#[tokio::test]
async fn malformed_price_is_absent() {
    let record = extract_from(product_html(Some("Mouse"), Some("12₽34"), None)).await;

    assert_eq!(record.price, None);
    assert_eq!(record.title.as_deref(), Some("Mouse"));
}

#[tokio::test]
async fn score_without_separator_leaves_both_parts_absent() {
    let record = extract_from(product_html(Some("Mouse"), Some("990 ₽"), Some("4.8 1234"))).await;

    assert_eq!(record.price, Some(990));
    assert_eq!(record.rating, None);
    assert_eq!(record.reviews_count, None);
}

#[tokio::test]
async fn empty_page_yields_url_only() {
    let record = extract_from("<html><body><p>Товар закончился</p></body></html>".to_string()).await;

    assert_eq!(record, ProductRecord::new(product_url("p-1")));
    assert!(!record.has_title());
}

#[tokio::test]
async fn url_follows_the_session_location_after_redirect() {
    let dir = TempDir::new().unwrap();
    let old = product_url("old-slug");
    let site = FixtureSite::new().redirect(
        &old,
        "https://shop.test/product/new-slug/?sh=abc",
        product_html(Some("Renamed"), None, None),
    );
    let mut session = HtmlSession::new(site);
    session.navigate(&old).await.unwrap();

    let record = FieldExtractor::new(settings(dir.path()).extractor)
        .extract(&session, &old)
        .await;

    assert_eq!(record.url, product_url("new-slug"));
    assert_eq!(record.title.as_deref(), Some("Renamed"));
}

#[tokio::test]
async fn session_without_a_page_still_returns_a_record() {
    let dir = TempDir::new().unwrap();
    let session = HtmlSession::new(FixtureSite::new());

    let record = FieldExtractor::new(settings(dir.path()).extractor)
        .extract(&session, "https://shop.test/product/x/?from=feed")
        .await;

    assert_eq!(record, ProductRecord::new(product_url("x")));
}

#[tokio::test]
async fn unresponsive_location_falls_back_to_the_requested_link() {
    let dir = TempDir::new().unwrap();
    let url = product_url("p-1");
    let mut session = ScriptedSession::new(
        FixtureSite::new().page(&url, product_html(Some("Mouse"), Some("990 ₽"), None)),
    );
    session.navigate(&url).await.unwrap();
    session.hang_current_url = true;
    let mut extractor_settings = settings(dir.path()).extractor;
    extractor_settings.read_timeout = Duration::from_millis(100);

    let record = tokio::time::timeout(
        Duration::from_secs(5),
        FieldExtractor::new(extractor_settings).extract(&session, &format!("{url}?from=search")),
    )
    .await
    .expect("extraction is bounded");

    assert_eq!(record.url, url);
    assert_eq!(record.title.as_deref(), Some("Mouse"));
    assert_eq!(record.price, Some(990));
}
