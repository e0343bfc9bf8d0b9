use crate::state::CrawlLevel;
use rand::Rng;
use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Catalog-Harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub site: SiteConfig,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub selectors: SelectorConfig,
}

/// The site being harvested
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Page carrying the catalog menu; also the base for relative links
    #[serde(rename = "root-url")]
    pub root_url: String,

    /// Query parameter holding the listing page number
    #[serde(rename = "page-param", default = "default_page_param")]
    pub page_param: String,
}

/// Listing crawl behavior
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Maximum number of category crawls holding an admission slot at once
    #[serde(rename = "concurrency-limit")]
    pub concurrency_limit: u32,

    /// Pause between two page fetches of the same category (seconds)
    #[serde(rename = "delay-between-pages")]
    pub delay_between_pages: DelayRange,

    /// Pause after a category finishes, before its slot is released (seconds)
    #[serde(rename = "delay-between-categories")]
    pub delay_between_categories: DelayRange,

    #[serde(rename = "request-timeout-seconds")]
    pub request_timeout_seconds: u64,

    /// Hard cap on listing pages fetched for one category
    #[serde(rename = "max-pages-per-category")]
    pub max_pages_per_category: u32,

    /// Which tree level supplies the crawl targets
    #[serde(rename = "crawl-level")]
    pub crawl_level: CrawlLevel,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            concurrency_limit: 5,
            delay_between_pages: DelayRange::new(1.0, 2.5),
            delay_between_categories: DelayRange::new(2.0, 4.0),
            request_timeout_seconds: 20,
            max_pages_per_category: 200,
            crawl_level: CrawlLevel::Leaves,
        }
    }
}

/// Client identification sent with every request
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Full `User-Agent` header value
    #[serde(default = "default_user_agent")]
    pub value: String,

    #[serde(rename = "accept-language", default = "default_accept_language")]
    pub accept_language: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            value: default_user_agent(),
            accept_language: default_accept_language(),
        }
    }
}

/// Output locations
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Directory receiving one `<slug>.json` snapshot per category
    #[serde(rename = "snapshot-dir", default = "default_snapshot_dir")]
    pub snapshot_dir: String,

    /// Where the resolved category tree is written
    #[serde(rename = "structure-path", default = "default_structure_path")]
    pub structure_path: String,

    /// SQLite database used by the ingest stage
    #[serde(rename = "database-path", default = "default_database_path")]
    pub database_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            snapshot_dir: default_snapshot_dir(),
            structure_path: default_structure_path(),
            database_path: default_database_path(),
        }
    }
}

/// Detail ingest behavior
#[derive(Debug, Clone, Deserialize)]
pub struct IngestConfig {
    #[serde(rename = "concurrency-limit", default = "default_ingest_concurrency")]
    pub concurrency_limit: u32,

    /// Pause before every product page request (seconds)
    #[serde(rename = "delay-before-request", default = "default_ingest_delay")]
    pub delay_before_request: f64,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            concurrency_limit: default_ingest_concurrency(),
            delay_before_request: default_ingest_delay(),
        }
    }
}

/// CSS selectors describing the site's markup
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct SelectorConfig {
    pub catalog_container: String,
    pub catalog_column: String,
    pub parent_item: String,
    pub parent_link: String,
    pub sub_menu: String,
    pub sub_item: String,
    pub sub_link: String,
    pub sub2_menu: String,
    pub sub2_link: String,

    pub product_container: String,
    pub product_link: String,
    pub next_page: String,
    pub page_number_link: String,

    pub product_title: String,
    pub product_image: String,
    pub product_description: String,
    pub description_heading: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            catalog_container: "div.menu-catalog".to_string(),
            catalog_column: "div.menu-catalog__list".to_string(),
            parent_item: "div.menu-catalog__item".to_string(),
            parent_link: "a.menu-catalog__link".to_string(),
            sub_menu: "div.menu-catalog__sub-menu".to_string(),
            sub_item: "div.menu-catalog__sub-item".to_string(),
            sub_link: "a.menu-catalog__sub-link".to_string(),
            sub2_menu: "div.menu-catalog__sub2-menu".to_string(),
            sub2_link: "a.menu-catalog__sub2-link".to_string(),

            product_container: "div.products__grid".to_string(),
            product_link: "a.product-mini__title-link, a.product-mini__picture".to_string(),
            next_page: "a.modern-page-next, a.pagination__item._next:not(._disabled)".to_string(),
            page_number_link: "a.pagination__item, .bx-pagination-container a".to_string(),

            product_title: "h1.title.headline-main__title.product-card__title".to_string(),
            product_image: "img.product-card__picture-view-img".to_string(),
            product_description: "div.product-card__description".to_string(),
            description_heading: "h4".to_string(),
        }
    }
}

/// A `[min, max]` interval in seconds from which politeness pauses are drawn
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(from = "(f64, f64)")]
pub struct DelayRange {
    pub min: f64,
    pub max: f64,
}

impl DelayRange {
    /// No pause at all
    pub const ZERO: DelayRange = DelayRange { min: 0.0, max: 0.0 };

    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Draws a duration uniformly from the interval
    ///
    /// Bounds that no `Duration` can hold saturate to `Duration::MAX`;
    /// negative or NaN bounds give zero.
    pub fn sample(&self) -> Duration {
        let secs = if self.min.is_finite() && self.max.is_finite() && self.max > self.min {
            rand::rng().random_range(self.min..=self.max)
        } else {
            self.min
        };
        if secs.is_nan() || secs <= 0.0 {
            return Duration::ZERO;
        }
        Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
    }
}

impl From<(f64, f64)> for DelayRange {
    fn from((min, max): (f64, f64)) -> Self {
        Self { min, max }
    }
}

fn default_page_param() -> String {
    "PAGEN_1".to_string()
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/125.0.0.0 Safari/537.36"
        .to_string()
}

fn default_accept_language() -> String {
    "ru-RU,ru;q=0.9,en-US;q=0.8,en;q=0.7".to_string()
}

fn default_snapshot_dir() -> String {
    "category_products".to_string()
}

fn default_structure_path() -> String {
    "categories_structure.json".to_string()
}

fn default_database_path() -> String {
    "catalog.db".to_string()
}

fn default_ingest_concurrency() -> u32 {
    10
}

fn default_ingest_delay() -> f64 {
    0.5
}
