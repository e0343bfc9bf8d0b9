//! Category tree resolution from the catalog menu
//!
//! The root page is fetched once. The menu is a container of columns, each
//! column holding parent items as direct children. A parent may carry a
//! level-1 sub-menu whose items may in turn carry a level-2 sub-menu.

use crate::config::CompiledSelectors;
use crate::crawler::fetcher::fetch_html;
use crate::state::{CategoryNode, CategoryTree};
use crate::url::resolve_link;
use crate::StructureError;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Fetches the root page and parses its catalog menu
///
/// Any failure here is fatal for the run: without a tree there is nothing to
/// crawl.
pub async fn resolve(
    client: &Client,
    root_url: &Url,
    selectors: &CompiledSelectors,
) -> Result<CategoryTree, StructureError> {
    tracing::info!("Resolving catalog structure from {}", root_url);
    let html = fetch_html(client, root_url).await?;
    let tree = parse_catalog(&html, root_url, selectors)?;
    tracing::info!("Resolved {} top-level categories", tree.len());
    Ok(tree)
}

/// Parses the catalog menu out of a root page
pub fn parse_catalog(
    html: &str,
    base_url: &Url,
    selectors: &CompiledSelectors,
) -> Result<CategoryTree, StructureError> {
    let document = Html::parse_document(html);

    let container = document
        .select(&selectors.catalog_container)
        .next()
        .ok_or_else(|| StructureError::NotFound {
            selector: selectors.source.catalog_container.clone(),
        })?;

    let columns: Vec<ElementRef> = container.select(&selectors.catalog_column).collect();
    if columns.is_empty() {
        return Err(StructureError::NotFound {
            selector: selectors.source.catalog_column.clone(),
        });
    }

    let mut tree = CategoryTree::new();
    for column in columns {
        for item in direct_children(column, &selectors.parent_item) {
            let Some((name, url)) = first_link(item, &selectors.parent_link, base_url) else {
                continue;
            };

            let children = match item.select(&selectors.sub_menu).next() {
                Some(sub_menu) => parse_first_level(sub_menu, selectors, base_url),
                None => Vec::new(),
            };

            let node = CategoryNode::new(name, url).with_children(children);
            if let Some(previous) = tree.insert(node) {
                tracing::warn!(
                    "Duplicate category name '{}': {} replaced by a later entry",
                    previous.name,
                    previous.url
                );
            }
        }
    }

    if tree.is_empty() {
        return Err(StructureError::Empty {
            selector: selectors.source.parent_link.clone(),
        });
    }

    Ok(tree)
}

fn parse_first_level(
    sub_menu: ElementRef,
    selectors: &CompiledSelectors,
    base_url: &Url,
) -> Vec<CategoryNode> {
    sub_menu
        .select(&selectors.sub_item)
        .filter_map(|sub_item| {
            let (name, url) = first_link(sub_item, &selectors.sub_link, base_url)?;
            let children = sub_item
                .select(&selectors.sub2_menu)
                .next()
                .map(|sub2_menu| {
                    sub2_menu
                        .select(&selectors.sub2_link)
                        .filter_map(|link| anchor(link, base_url))
                        .map(|(name, url)| CategoryNode::new(name, url))
                        .collect()
                })
                .unwrap_or_default();
            Some(CategoryNode::new(name, url).with_children(children))
        })
        .collect()
}

/// Child elements of `parent` matching `selector`, without descending further
fn direct_children<'a>(
    parent: ElementRef<'a>,
    selector: &'a Selector,
) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    parent
        .children()
        .filter_map(ElementRef::wrap)
        .filter(move |child| selector.matches(child))
}

fn first_link(element: ElementRef, selector: &Selector, base_url: &Url) -> Option<(String, Url)> {
    element
        .select(selector)
        .next()
        .and_then(|link| anchor(link, base_url))
}

/// Trimmed text and resolved href of an anchor; None when either is unusable
fn anchor(link: ElementRef, base_url: &Url) -> Option<(String, Url)> {
    let name = link.text().collect::<String>().trim().to_string();
    if name.is_empty() {
        return None;
    }
    let url = resolve_link(link.value().attr("href")?, base_url)?;
    Some((name, url))
}
