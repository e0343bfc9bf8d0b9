//! Integration tests for the harvester
//!
//! These tests use wiremock to serve a small shop: a catalog menu on the
//! root page and paginated listings under it. They run the full harvest and
//! check the snapshots it leaves behind.

use catalog_harvest::config::{parse_config, Config};
use catalog_harvest::crawler::{build_http_client, run_crawl, ListingCrawler};
use catalog_harvest::ingest::run_ingest;
use catalog_harvest::output::{load_snapshots, read_failed_log, read_structure, Snapshot};
use catalog_harvest::state::{CrawlTarget, TerminationReason};
use catalog_harvest::storage::{open_store, CatalogStore};
use catalog_harvest::{HarvestError, StructureError};
use std::collections::BTreeSet;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use url::Url;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration with politeness delays turned off
fn create_test_config(server: &MockServer, dir: &TempDir, concurrency: u32) -> Config {
    let toml = format!(
        r#"
        [site]
        root-url = "{uri}/"

        [crawler]
        concurrency-limit = {concurrency}
        delay-between-pages = [0.0, 0.0]
        delay-between-categories = [0.0, 0.0]
        request-timeout-seconds = 5

        [output]
        snapshot-dir = "{dir}/category_products"
        structure-path = "{dir}/categories_structure.json"
        database-path = "{dir}/catalog.db"

        [ingest]
        delay-before-request = 0.0
        "#,
        uri = server.uri(),
        concurrency = concurrency,
        dir = dir.path().display()
    );
    parse_config(&toml).expect("Failed to parse test config")
}

/// Root page with one menu column; each entry is `(name, path, children)`
fn catalog_page(parents: &[(&str, &str, Vec<(&str, &str)>)]) -> String {
    let items: String = parents
        .iter()
        .map(|(name, href, children)| {
            let sub_menu = if children.is_empty() {
                String::new()
            } else {
                let subs: String = children
                    .iter()
                    .map(|(name, href)| {
                        format!(
                            r#"<div class="menu-catalog__sub-item"><a class="menu-catalog__sub-link" href="{}">{}</a></div>"#,
                            href, name
                        )
                    })
                    .collect();
                format!(r#"<div class="menu-catalog__sub-menu">{}</div>"#, subs)
            };
            format!(
                r#"<div class="menu-catalog__item"><a class="menu-catalog__link" href="{}">{}</a>{}</div>"#,
                href, name, sub_menu
            )
        })
        .collect();

    format!(
        r#"<html><body><div class="menu-catalog"><div class="menu-catalog__list">{}</div></div></body></html>"#,
        items
    )
}

/// Listing page with product cards and an optional "next" control
fn listing_page(product_ids: impl IntoIterator<Item = u32>, next: Option<&str>) -> String {
    let cards: String = product_ids
        .into_iter()
        .map(|id| {
            format!(
                r#"<div class="product-mini">
                     <a class="product-mini__picture" href="/product/{0}/"><img src="/img/{0}.jpg"></a>
                     <a class="product-mini__title-link" href="/product/{0}/">Product {0}</a>
                   </div>"#,
                id
            )
        })
        .collect();
    let pager = next
        .map(|href| format!(r#"<a class="modern-page-next" href="{}">Next</a>"#, href))
        .unwrap_or_default();

    format!(
        r#"<html><body><div class="products__grid">{}</div>{}</body></html>"#,
        cards, pager
    )
}

async fn mount_page(server: &MockServer, page_path: &str, body: String, times: u64) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(times)
        .mount(server)
        .await;
}

/// Serves `<page_path>?PAGEN_1=2`, the URL the crawler synthesizes when a
/// listing page has no pagination controls
async fn mount_page_two_fallback(server: &MockServer, page_path: &str, body: String, times: u64) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .and(query_param("PAGEN_1", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .with_priority(1)
        .expect(times)
        .mount(server)
        .await;
}

fn empty_listing() -> String {
    listing_page(std::iter::empty(), None)
}

fn snapshot_dir(dir: &TempDir) -> std::path::PathBuf {
    dir.path().join("category_products")
}

fn snapshots(dir: &TempDir) -> Vec<Snapshot> {
    load_snapshots(&snapshot_dir(dir))
        .expect("Failed to load snapshots")
        .into_iter()
        .map(|(_, s)| s)
        .collect()
}

fn snapshot_for<'a>(all: &'a [Snapshot], slug: &str) -> &'a Snapshot {
    all.iter()
        .find(|s| s.category_name_slug == slug)
        .unwrap_or_else(|| panic!("no snapshot for {}", slug))
}

#[tokio::test]
async fn test_parent_without_subcategories_is_crawled() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_page(&server, "/", catalog_page(&[("Optics", "/catalog/optics/", vec![])]), 1).await;
    mount_page(&server, "/catalog/optics/", listing_page(1..=3, Some("/catalog/optics/page-2/")), 1).await;
    mount_page(&server, "/catalog/optics/page-2/", listing_page(4..=5, Some("/catalog/optics/page-3/")), 1).await;
    mount_page(&server, "/catalog/optics/page-3/", listing_page(std::iter::empty(), None), 1).await;

    let summary = run_crawl(create_test_config(&server, &dir, 5), false)
        .await
        .expect("Harvest failed");

    assert_eq!(summary.complete, 1);
    assert_eq!(summary.total_product_urls, 5);

    let all = snapshots(&dir);
    assert_eq!(all.len(), 1);
    let optics = snapshot_for(&all, "optics");
    assert_eq!(optics.category_url, format!("{}/catalog/optics/", server.uri()));
    assert_eq!(optics.product_urls.len(), 5);

    let mut sorted = optics.product_urls.clone();
    sorted.sort();
    sorted.dedup();
    assert_eq!(sorted, optics.product_urls, "snapshot must be sorted and duplicate-free");
    assert!(optics
        .product_urls
        .iter()
        .all(|u| u.starts_with(&format!("{}/product/", server.uri()))));

    let tree = read_structure(&dir.path().join("categories_structure.json")).unwrap();
    assert!(tree.get("Optics").unwrap().is_leaf());
}

#[tokio::test]
async fn test_repeated_page_stops_after_second_page() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_page(&server, "/", catalog_page(&[("Masks", "/catalog/masks/", vec![])]), 1).await;
    mount_page(&server, "/catalog/masks/", listing_page(1..=20, Some("/catalog/masks/page-2/")), 1).await;
    mount_page(&server, "/catalog/masks/page-2/", listing_page(1..=20, Some("/catalog/masks/page-3/")), 1).await;
    mount_page(&server, "/catalog/masks/page-3/", listing_page(21..=30, None), 0).await;

    run_crawl(create_test_config(&server, &dir, 5), false)
        .await
        .expect("Harvest failed");

    let all = snapshots(&dir);
    assert_eq!(snapshot_for(&all, "masks").product_urls.len(), 20);
}

#[tokio::test]
async fn test_identical_new_link_sets_never_fetch_next_page() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_page(&server, "/", catalog_page(&[("Gels", "/catalog/gels/", vec![])]), 1).await;
    mount_page(&server, "/catalog/gels/", listing_page(1..=5, Some("/catalog/gels/page-2/")), 1).await;
    mount_page(&server, "/catalog/gels/page-2/", listing_page(6..=10, Some("/catalog/gels/page-3/")), 1).await;
    mount_page(&server, "/catalog/gels/page-3/", listing_page(6..=10, Some("/catalog/gels/page-4/")), 1).await;
    mount_page(&server, "/catalog/gels/page-4/", listing_page(11..=15, None), 0).await;

    run_crawl(create_test_config(&server, &dir, 5), false)
        .await
        .expect("Harvest failed");

    let all = snapshots(&dir);
    assert_eq!(snapshot_for(&all, "gels").product_urls.len(), 10);
}

#[tokio::test]
async fn test_fetch_failure_keeps_partial_results() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_page(
        &server,
        "/",
        catalog_page(&[
            ("Vitamins", "/catalog/vitamins/", vec![]),
            ("Hygiene", "/catalog/hygiene/", vec![]),
        ]),
        1,
    )
    .await;
    mount_page(&server, "/catalog/vitamins/", listing_page(1..=10, Some("/catalog/vitamins/page-2/")), 1).await;
    mount_page(&server, "/catalog/vitamins/page-2/", listing_page(11..=15, Some("/catalog/vitamins/page-3/")), 1).await;
    Mock::given(method("GET"))
        .and(path("/catalog/vitamins/page-3/"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;
    mount_page(&server, "/catalog/hygiene/", listing_page(100..=102, None), 1).await;
    mount_page_two_fallback(&server, "/catalog/hygiene/", empty_listing(), 1).await;

    let summary = run_crawl(create_test_config(&server, &dir, 5), false)
        .await
        .expect("Harvest failed");

    assert_eq!(summary.failed_partial, 1);
    assert_eq!(summary.complete, 1);

    let all = snapshots(&dir);
    assert_eq!(snapshot_for(&all, "vitamins").product_urls.len(), 15);
    assert_eq!(snapshot_for(&all, "hygiene").product_urls.len(), 3);

    let failed = read_failed_log(&snapshot_dir(&dir)).unwrap();
    let expected: BTreeSet<String> = [format!("{}/catalog/vitamins/", server.uri())].into();
    assert_eq!(failed, expected);
}

#[tokio::test]
async fn test_missing_catalog_container_is_fatal() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_page(&server, "/", "<html><body><nav>no menu</nav></body></html>".to_string(), 1).await;

    let result = run_crawl(create_test_config(&server, &dir, 5), false).await;
    assert!(matches!(
        result,
        Err(HarvestError::Structure(StructureError::NotFound { .. }))
    ));

    assert!(snapshots(&dir).is_empty());
    assert!(!dir.path().join("categories_structure.json").exists());
}

#[tokio::test]
async fn test_menu_without_categories_is_fatal() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    let body = r#"<html><body><div class="menu-catalog"><div class="menu-catalog__list">
                    <div class="menu-catalog__item"><span>Soon</span></div>
                  </div></div></body></html>"#;
    mount_page(&server, "/", body.to_string(), 1).await;

    let result = run_crawl(create_test_config(&server, &dir, 5), false).await;
    assert!(matches!(
        result,
        Err(HarvestError::Structure(StructureError::Empty { .. }))
    ));
    assert!(snapshots(&dir).is_empty());
    assert!(!dir.path().join("categories_structure.json").exists());
}

#[tokio::test]
async fn test_unreachable_root_is_fatal() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let result = run_crawl(create_test_config(&server, &dir, 5), false).await;
    assert!(matches!(
        result,
        Err(HarvestError::Structure(StructureError::Fetch(_)))
    ));
    assert!(snapshots(&dir).is_empty());
}

#[tokio::test]
async fn test_concurrency_limit_is_respected() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    let parents: Vec<(String, String)> = (0..8)
        .map(|i| (format!("Category {}", i), format!("/catalog/c{}/", i)))
        .collect();
    let menu: Vec<(&str, &str, Vec<(&str, &str)>)> = parents
        .iter()
        .map(|(name, href)| (name.as_str(), href.as_str(), Vec::new()))
        .collect();
    mount_page(&server, "/", catalog_page(&menu), 1).await;

    for (i, (_, href)) in parents.iter().enumerate() {
        let first = i as u32 * 10;
        mount_page_two_fallback(&server, href, empty_listing(), 1).await;
        Mock::given(method("GET"))
            .and(path(href.as_str()))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(listing_page(first..first + 3, None))
                    .set_delay(Duration::from_millis(50)),
            )
            .mount(&server)
            .await;
    }

    let summary = run_crawl(create_test_config(&server, &dir, 2), false)
        .await
        .expect("Harvest failed");

    assert_eq!(summary.crawled(), 8);
    assert!(summary.peak_in_flight <= 2, "peak was {}", summary.peak_in_flight);
    assert!(summary.peak_in_flight >= 1);
    assert_eq!(snapshots(&dir).len(), 8);
}

#[tokio::test]
async fn test_rerun_yields_identical_snapshots() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_page(
        &server,
        "/",
        catalog_page(&[(
            "Medicines",
            "/catalog/medicines/",
            vec![("Joints", "/catalog/medicines/joints/"), ("Colds", "/catalog/medicines/colds/")],
        )]),
        2,
    )
    .await;
    mount_page(&server, "/catalog/medicines/joints/", listing_page([3, 1, 2], None), 2).await;
    mount_page_two_fallback(&server, "/catalog/medicines/joints/", empty_listing(), 2).await;
    mount_page(&server, "/catalog/medicines/colds/", listing_page([2, 4], None), 2).await;
    mount_page_two_fallback(&server, "/catalog/medicines/colds/", listing_page([2, 4], None), 2).await;

    run_crawl(create_test_config(&server, &dir, 5), true).await.unwrap();
    let first = snapshots(&dir);
    run_crawl(create_test_config(&server, &dir, 5), true).await.unwrap();
    let second = snapshots(&dir);

    assert_eq!(first.len(), 2);
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_resume_skips_finished_categories() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let menu = catalog_page(&[
        ("Optics", "/catalog/optics/", vec![]),
        ("Vitamins", "/catalog/vitamins/", vec![]),
    ]);

    mount_page(&server, "/", menu.clone(), 1).await;
    mount_page(&server, "/catalog/optics/", listing_page(1..=2, None), 1).await;
    mount_page_two_fallback(&server, "/catalog/optics/", empty_listing(), 1).await;
    Mock::given(method("GET"))
        .and(path("/catalog/vitamins/"))
        .respond_with(ResponseTemplate::new(502))
        .expect(1)
        .mount(&server)
        .await;

    let first = run_crawl(create_test_config(&server, &dir, 5), false).await.unwrap();
    assert_eq!(first.failed_partial, 1);

    server.verify().await;
    server.reset().await;

    // Only the failed category is fetched again
    mount_page(&server, "/", menu, 1).await;
    mount_page(&server, "/catalog/optics/", listing_page(1..=2, None), 0).await;
    mount_page(&server, "/catalog/vitamins/", listing_page(10..=12, None), 1).await;
    mount_page_two_fallback(&server, "/catalog/vitamins/", empty_listing(), 1).await;

    let second = run_crawl(create_test_config(&server, &dir, 5), false).await.unwrap();
    assert_eq!(second.resumed, 1);
    assert_eq!(second.complete, 1);
    assert_eq!(second.failed_partial, 0);

    assert!(read_failed_log(&snapshot_dir(&dir)).unwrap().is_empty());
    assert_eq!(snapshot_for(&snapshots(&dir), "vitamins").product_urls.len(), 3);
}

#[tokio::test]
async fn test_ingest_stores_products_from_snapshots() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_page(&server, "/", catalog_page(&[("Vitamins", "/catalog/vitamins/", vec![])]), 1).await;
    mount_page(&server, "/catalog/vitamins/", listing_page(1..=3, None), 1).await;
    mount_page_two_fallback(&server, "/catalog/vitamins/", empty_listing(), 1).await;

    for id in 1..=2 {
        let body = format!(
            r#"<html><body>
                 <h1 class="title headline-main__title product-card__title">Vitamin {0}</h1>
                 <img class="product-card__picture-view-img" src="/img/{0}.jpg">
                 <div class="product-card__description"><h4>Usage</h4><p>Once a day</p></div>
               </body></html>"#,
            id
        );
        mount_page(&server, &format!("/product/{}/", id), body, 1).await;
    }
    // Product 3 has no title and is skipped
    mount_page(&server, "/product/3/", "<html><body>Gone</body></html>".to_string(), 1).await;

    let config = create_test_config(&server, &dir, 5);
    run_crawl(config.clone(), false).await.unwrap();

    let summary = run_ingest(&config).await.expect("Ingest failed");
    assert_eq!(summary.products_queued, 3);
    assert_eq!(summary.stored, 2);
    assert_eq!(summary.skipped_without_title, 1);

    let store = open_store(Path::new(&config.output.database_path)).unwrap();
    assert_eq!(store.count_category_types().unwrap(), 1);
    assert_eq!(store.count_products().unwrap(), 2);

    let row = store.get_product("Vitamin 1").unwrap().unwrap();
    assert_eq!(row.description, "Usage:\nOnce a day");
    assert_eq!(row.image_url, Some(format!("{}/img/1.jpg", server.uri())));
}

fn listing_crawler(config: &Config) -> ListingCrawler {
    let client = build_http_client(&config.user_agent, Duration::from_secs(5)).unwrap();
    let selectors = config.selectors.compile().unwrap();
    ListingCrawler::new(client, &selectors, &config.site, &config.crawler)
}

fn target(server: &MockServer, name: &str, page_path: &str) -> CrawlTarget {
    CrawlTarget {
        name: name.to_string(),
        url: Url::parse(&format!("{}{}", server.uri(), page_path)).unwrap(),
        slug: name.to_lowercase(),
    }
}

#[tokio::test]
async fn test_page_number_fallback_ends_on_empty_page() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_page(&server, "/catalog/drops/", listing_page(1..=4, None), 1).await;
    mount_page_two_fallback(&server, "/catalog/drops/", empty_listing(), 1).await;

    let config = create_test_config(&server, &dir, 5);
    let outcome = listing_crawler(&config)
        .crawl_category(&target(&server, "Drops", "/catalog/drops/"))
        .await;

    assert_eq!(outcome.reason, TerminationReason::EmptyPage);
    assert_eq!(outcome.pages_fetched, 2);
    assert_eq!(outcome.product_urls.len(), 4);
    assert!(outcome.error.is_none());
}

#[tokio::test]
async fn test_page_number_fallback_ends_on_repeated_first_page() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    // Sites that ignore an out-of-range page number serve page 1 again
    mount_page(&server, "/catalog/sprays/", listing_page(1..=4, None), 1).await;
    mount_page_two_fallback(&server, "/catalog/sprays/", listing_page(1..=4, None), 1).await;

    let config = create_test_config(&server, &dir, 5);
    let outcome = listing_crawler(&config)
        .crawl_category(&target(&server, "Sprays", "/catalog/sprays/"))
        .await;

    assert_eq!(outcome.reason, TerminationReason::OnlyDuplicates);
    assert_eq!(outcome.pages_fetched, 2);
    assert_eq!(outcome.product_urls.len(), 4);
}
