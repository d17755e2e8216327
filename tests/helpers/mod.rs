#![allow(dead_code)]

use careermatch::catalog::{Catalog, CatalogItem};
use careermatch::embedding::EmbeddingProvider;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Words the fake model "understands". One dimension per word.
pub const VOCAB: &[&str] = &[
    "data", "statistics", "python", "design", "users", "prototype", "network", "router",
    "security",
];

/// Bag-of-words embedding over [`VOCAB`]. Deterministic, and texts sharing no
/// vocabulary words map to the zero vector.
pub fn bag_of_words(text: &str) -> Vec<f32> {
    let mut v = vec![0.0f32; VOCAB.len()];
    for word in text
        .split(|c: char| !c.is_alphanumeric())
        .map(str::to_lowercase)
    {
        if let Some(i) = VOCAB.iter().position(|w| *w == word) {
            v[i] += 1.0;
        }
    }
    v
}

/// Fake provider that records how often and with how much it was called.
#[derive(Default)]
pub struct CountingProvider {
    pub batch_calls: AtomicUsize,
    pub texts_embedded: AtomicUsize,
    /// Sleep applied to single-text (query) batches.
    pub query_delay: Option<Duration>,
}

impl CountingProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slow_queries(delay: Duration) -> Self {
        Self {
            query_delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn batch_calls(&self) -> usize {
        self.batch_calls.load(Ordering::SeqCst)
    }

    pub fn texts_embedded(&self) -> usize {
        self.texts_embedded.load(Ordering::SeqCst)
    }
}

impl EmbeddingProvider for CountingProvider {
    fn embed_batch(&self, texts: &[&str]) -> anyhow::Result<Vec<Vec<f32>>> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        self.texts_embedded.fetch_add(texts.len(), Ordering::SeqCst);
        if texts.len() == 1 {
            if let Some(delay) = self.query_delay {
                std::thread::sleep(delay);
            }
        }
        Ok(texts.iter().map(|t| bag_of_words(t)).collect())
    }

    fn dimensions(&self) -> usize {
        VOCAB.len()
    }
}

/// Provider whose model is unavailable.
pub struct FailingProvider;

impl EmbeddingProvider for FailingProvider {
    fn embed_batch(&self, _texts: &[&str]) -> anyhow::Result<Vec<Vec<f32>>> {
        anyhow::bail!("model not loaded")
    }

    fn dimensions(&self) -> usize {
        VOCAB.len()
    }
}

/// Provider that silently drops the last vector of every batch.
pub struct MisalignedProvider;

impl EmbeddingProvider for MisalignedProvider {
    fn embed_batch(&self, texts: &[&str]) -> anyhow::Result<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .skip(1)
            .map(|t| bag_of_words(t))
            .collect())
    }

    fn dimensions(&self) -> usize {
        VOCAB.len()
    }
}

pub fn career(title: &str, description: &str, skills: &str, personality: &str) -> CatalogItem {
    CatalogItem {
        title: title.to_string(),
        description: description.to_string(),
        skills: skills.to_string(),
        personality_match: personality.to_string(),
        education_required: "Bachelor's".to_string(),
        average_salary: 90_000.0,
        job_outlook: "Growing".to_string(),
        learning_resources: "[]".to_string(),
    }
}

/// Three careers with distinct, non-overlapping embeddings.
pub fn three_careers() -> Catalog {
    Catalog::new(vec![
        career("Data Scientist", "data statistics", "python", "analytical"),
        career("UX Designer", "design users", "prototype", "empathetic"),
        career("Network Engineer", "network router", "security", "methodical"),
    ])
}

/// Catalog of `n` careers cycling through the three base embeddings.
pub fn catalog_of(n: usize) -> Catalog {
    let base = three_careers();
    Catalog::new(
        (0..n)
            .map(|i| {
                let mut item = base.items()[i % 3].clone();
                item.title = format!("{} {i}", item.title);
                item
            })
            .collect(),
    )
}
