use crate::config::types::SelectorConfig;
use crate::ConfigError;
use scraper::Selector;

/// Parses one CSS selector, mapping failures to a config error
pub fn compile_selector(selector: &str) -> Result<Selector, ConfigError> {
    Selector::parse(selector).map_err(|e| ConfigError::InvalidSelector {
        selector: selector.to_string(),
        message: e.to_string(),
    })
}

/// `SelectorConfig` with every entry parsed, built once per run
#[derive(Debug, Clone)]
pub struct CompiledSelectors {
    pub catalog_container: Selector,
    pub catalog_column: Selector,
    pub parent_item: Selector,
    pub parent_link: Selector,
    pub sub_menu: Selector,
    pub sub_item: Selector,
    pub sub_link: Selector,
    pub sub2_menu: Selector,
    pub sub2_link: Selector,

    pub product_container: Selector,
    pub product_link: Selector,
    pub next_page: Selector,
    pub page_number_link: Selector,

    pub product_title: Selector,
    pub product_image: Selector,
    pub product_description: Selector,
    pub description_heading: Selector,

    /// The text the selectors were parsed from, for error messages
    pub source: SelectorConfig,
}

impl SelectorConfig {
    pub fn compile(&self) -> Result<CompiledSelectors, ConfigError> {
        Ok(CompiledSelectors {
            catalog_container: compile_selector(&self.catalog_container)?,
            catalog_column: compile_selector(&self.catalog_column)?,
            parent_item: compile_selector(&self.parent_item)?,
            parent_link: compile_selector(&self.parent_link)?,
            sub_menu: compile_selector(&self.sub_menu)?,
            sub_item: compile_selector(&self.sub_item)?,
            sub_link: compile_selector(&self.sub_link)?,
            sub2_menu: compile_selector(&self.sub2_menu)?,
            sub2_link: compile_selector(&self.sub2_link)?,
            product_container: compile_selector(&self.product_container)?,
            product_link: compile_selector(&self.product_link)?,
            next_page: compile_selector(&self.next_page)?,
            page_number_link: compile_selector(&self.page_number_link)?,
            product_title: compile_selector(&self.product_title)?,
            product_image: compile_selector(&self.product_image)?,
            product_description: compile_selector(&self.product_description)?,
            description_heading: compile_selector(&self.description_heading)?,
            source: self.clone(),
        })
    }
}
