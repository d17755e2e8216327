//! The ordered career catalog.
//!
//! Loaded once at startup from a JSON file and held read-only for the rest of
//! the process. Iteration order is the order rows appear in the file, and the
//! embedding matrix is index-aligned with it.

pub mod types;

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

pub use types::CatalogItem;

/// Accepted file shapes: a bare array, or `{ "careers": [...] }`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CatalogFile {
    Bare(Vec<CatalogItem>),
    Wrapped { careers: Vec<CatalogItem> },
}

/// Ordered, immutable collection of careers.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    items: Vec<CatalogItem>,
}

impl Catalog {
    pub fn new(items: Vec<CatalogItem>) -> Self {
        Self { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }

    pub fn get(&self, index: usize) -> Option<&CatalogItem> {
        self.items.get(index)
    }

    /// Titles in catalog order.
    pub fn titles(&self) -> Vec<String> {
        self.items.iter().map(|item| item.title.clone()).collect()
    }

    /// Embedding inputs in catalog order.
    pub fn combined_texts(&self) -> Vec<String> {
        self.items.iter().map(CatalogItem::combined_text).collect()
    }

    /// Parse a catalog from JSON text.
    pub fn from_json(json: &str) -> Result<Self> {
        let file: CatalogFile =
            serde_json::from_str(json).context("failed to parse catalog JSON")?;
        let items = match file {
            CatalogFile::Bare(items) => items,
            CatalogFile::Wrapped { careers } => careers,
        };
        Ok(Self::new(items))
    }

    /// Load a catalog from a JSON file on disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read catalog file: {}", path.display()))?;
        let catalog = Self::from_json(&json)
            .with_context(|| format!("invalid catalog file: {}", path.display()))?;

        let untitled = catalog.items.iter().filter(|i| i.title.is_empty()).count();
        if untitled > 0 {
            tracing::warn!(untitled, "catalog contains careers without a title");
        }
        tracing::info!(path = %path.display(), careers = catalog.len(), "catalog loaded");
        Ok(catalog)
    }
}
