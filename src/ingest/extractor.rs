//! Field extraction from product detail pages

use crate::config::CompiledSelectors;
use crate::url::resolve_link;
use scraper::{ElementRef, Html};
use url::Url;

/// Fields extracted from one product page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductRecord {
    pub url: Url,
    pub title: String,
    /// `(section title, section text)` in page order
    pub description: Vec<(String, String)>,
    pub image_url: Option<Url>,
    pub category_label: String,
}

impl ProductRecord {
    /// Renders the description as `"<title>:\n<text>"` sections separated by
    /// blank lines
    pub fn description_text(&self) -> String {
        self.description
            .iter()
            .map(|(title, text)| format!("{}:\n{}", title, text))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Extracts a product from its detail page
///
/// Returns None when the page has no (non-empty) title; such pages are not
/// products.
pub fn extract_product(
    html: &str,
    page_url: &Url,
    category_label: &str,
    selectors: &CompiledSelectors,
) -> Option<ProductRecord> {
    let document = Html::parse_document(html);

    let title = document
        .select(&selectors.product_title)
        .next()
        .map(collapse_text)
        .filter(|t| !t.is_empty())?;

    let image_url = document
        .select(&selectors.product_image)
        .filter_map(|img| img.value().attr("src"))
        .find_map(|src| resolve_link(src, page_url));

    let description = document
        .select(&selectors.product_description)
        .next()
        .map(|block| description_sections(block, selectors))
        .unwrap_or_default();

    Some(ProductRecord {
        url: page_url.clone(),
        title,
        description,
        image_url,
        category_label: category_label.to_string(),
    })
}

/// One section per heading: the heading text, and the text of the sibling
/// elements that follow it up to the next heading
fn description_sections(block: ElementRef, selectors: &CompiledSelectors) -> Vec<(String, String)> {
    block
        .select(&selectors.description_heading)
        .filter_map(|heading| {
            let title = collapse_text(heading);
            if title.is_empty() {
                return None;
            }

            let text = heading
                .next_siblings()
                .filter_map(ElementRef::wrap)
                .take_while(|sibling| !selectors.description_heading.matches(sibling))
                .map(collapse_text)
                .filter(|t| !t.is_empty())
                .collect::<Vec<_>>()
                .join(" ");
            Some((title, text))
        })
        .collect()
}

/// Element text with whitespace runs collapsed to single spaces
fn collapse_text(element: ElementRef) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}
