//! Category tree resolved from the catalog menu
//!
//! The tree is at most three levels deep below an implicit root: top-level
//! parents, level-1 subcategories, and level-2 subcategories. On disk it uses
//! the structure document format: a mapping of parent name to
//! `{url, subcategories: [{name, url, subcategories}]}` in document order.

use crate::url::category_slug;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashSet;
use std::fmt;
use url::Url;

/// A single category in the catalog menu
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryNode {
    pub name: String,
    pub url: Url,
    /// Subcategories in document order
    pub children: Vec<CategoryNode>,
}

impl CategoryNode {
    pub fn new(name: impl Into<String>, url: Url) -> Self {
        Self {
            name: name.into(),
            url,
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<CategoryNode>) -> Self {
        self.children = children;
        self
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a CategoryNode>) {
        if self.is_leaf() {
            out.push(self);
        } else {
            for child in &self.children {
                child.collect_leaves(out);
            }
        }
    }

    fn find_by_url(&self, url: &Url) -> Option<&CategoryNode> {
        if &self.url == url {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find_by_url(url))
    }
}

/// Which level of the tree supplies crawl targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CrawlLevel {
    /// Every node without children
    #[default]
    Leaves,
    /// Level-1 subcategories; their listings already include level-2 products
    FirstLevel,
}

/// A category selected for a listing crawl
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTarget {
    pub name: String,
    pub url: Url,
    /// File-name-safe label derived from the URL's last path segment
    pub slug: String,
}

impl CrawlTarget {
    pub fn from_node(node: &CategoryNode) -> Self {
        Self {
            name: node.name.clone(),
            url: node.url.clone(),
            slug: category_slug(&node.url),
        }
    }
}

/// Ordered collection of top-level parent categories, keyed by name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryTree {
    parents: Vec<CategoryNode>,
}

impl CategoryTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a parent category
    ///
    /// A parent whose name is already present replaces the earlier entry at
    /// the earlier entry's position; the replaced node is returned.
    pub fn insert(&mut self, node: CategoryNode) -> Option<CategoryNode> {
        match self.parents.iter_mut().find(|p| p.name == node.name) {
            Some(existing) => Some(std::mem::replace(existing, node)),
            None => {
                self.parents.push(node);
                None
            }
        }
    }

    pub fn parents(&self) -> &[CategoryNode] {
        &self.parents
    }

    pub fn get(&self, name: &str) -> Option<&CategoryNode> {
        self.parents.iter().find(|p| p.name == name)
    }

    pub fn len(&self) -> usize {
        self.parents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }

    /// Finds the node (at any depth) whose URL equals `url`
    pub fn find_by_url(&self, url: &Url) -> Option<&CategoryNode> {
        self.parents.iter().find_map(|p| p.find_by_url(url))
    }

    /// Returns the categories to crawl, de-duplicated by URL
    ///
    /// A parent without subcategories is always its own target. The first
    /// occurrence of a URL wins.
    pub fn crawl_targets(&self, level: CrawlLevel) -> Vec<CrawlTarget> {
        let mut nodes: Vec<&CategoryNode> = Vec::new();
        for parent in &self.parents {
            match level {
                CrawlLevel::Leaves => parent.collect_leaves(&mut nodes),
                CrawlLevel::FirstLevel if parent.is_leaf() => nodes.push(parent),
                CrawlLevel::FirstLevel => nodes.extend(parent.children.iter()),
            }
        }

        let mut seen = HashSet::new();
        nodes
            .into_iter()
            .filter(|node| seen.insert(node.url.as_str().to_string()))
            .map(CrawlTarget::from_node)
            .collect()
    }
}

#[derive(Serialize, Deserialize)]
struct ParentEntry {
    url: Url,
    #[serde(default)]
    subcategories: Vec<SubcategoryEntry>,
}

#[derive(Serialize, Deserialize)]
struct SubcategoryEntry {
    name: String,
    url: Url,
    #[serde(default)]
    subcategories: Vec<SubcategoryEntry>,
}

impl From<&CategoryNode> for SubcategoryEntry {
    fn from(node: &CategoryNode) -> Self {
        Self {
            name: node.name.clone(),
            url: node.url.clone(),
            subcategories: node.children.iter().map(SubcategoryEntry::from).collect(),
        }
    }
}

impl From<SubcategoryEntry> for CategoryNode {
    fn from(entry: SubcategoryEntry) -> Self {
        CategoryNode {
            name: entry.name,
            url: entry.url,
            children: entry.subcategories.into_iter().map(CategoryNode::from).collect(),
        }
    }
}

// Hand-written so document order survives a round trip through JSON
impl Serialize for CategoryTree {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.parents.len()))?;
        for parent in &self.parents {
            let entry = ParentEntry {
                url: parent.url.clone(),
                subcategories: parent.children.iter().map(SubcategoryEntry::from).collect(),
            };
            map.serialize_entry(&parent.name, &entry)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for CategoryTree {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct TreeVisitor;

        impl<'de> Visitor<'de> for TreeVisitor {
            type Value = CategoryTree;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of category name to {url, subcategories}")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut tree = CategoryTree::new();
                while let Some((name, entry)) = access.next_entry::<String, ParentEntry>()? {
                    let children = entry
                        .subcategories
                        .into_iter()
                        .map(CategoryNode::from)
                        .collect();
                    tree.insert(CategoryNode::new(name, entry.url).with_children(children));
                }
                Ok(tree)
            }
        }

        deserializer.deserialize_map(TreeVisitor)
    }
}
