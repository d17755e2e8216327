//! Recommendation service.
//!
//! [`Recommender`] is built once per process from a catalog, an embedding
//! provider and an [`EmbeddingStore`], and then shared by `Arc` with every
//! request handler. After construction it is immutable: ranking is a pure read
//! and needs no locking.

pub mod rank;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::sync::OnceCell;

use crate::catalog::Catalog;
use crate::config::CareerMatchConfig;
use crate::embedding::EmbeddingProvider;
use crate::error::RecommendError;
use crate::store::{CacheOutcome, EmbeddingMatrix, EmbeddingStore};

pub use rank::ScoredResult;

pub struct Recommender {
    catalog: Catalog,
    matrix: EmbeddingMatrix,
    provider: Arc<dyn EmbeddingProvider>,
    cache_outcome: CacheOutcome,
}

impl std::fmt::Debug for Recommender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Recommender")
            .field("careers", &self.catalog.len())
            .field("dim", &self.matrix.dim())
            .field("cache_outcome", &self.cache_outcome)
            .finish()
    }
}

impl Recommender {
    /// Blocking setup: load or compute the embedding matrix for `catalog`.
    ///
    /// Fails with [`RecommendError::EmptyCatalog`] or
    /// [`RecommendError::EmbeddingUnavailable`]; a cache write failure is only
    /// logged.
    pub fn initialize(
        catalog: Catalog,
        provider: Arc<dyn EmbeddingProvider>,
        store: &EmbeddingStore,
    ) -> Result<Self, RecommendError> {
        let init = store.initialize(&catalog, provider.as_ref())?;
        tracing::info!(
            careers = catalog.len(),
            dim = init.matrix.dim(),
            outcome = ?init.outcome,
            persisted = init.persistence.is_none(),
            "recommender ready"
        );
        Ok(Self {
            catalog,
            matrix: init.matrix,
            provider,
            cache_outcome: init.outcome,
        })
    }

    /// Load the catalog, create the provider and initialize against the
    /// configured cache. Blocking.
    pub fn from_config(config: &CareerMatchConfig) -> anyhow::Result<Self> {
        let catalog = Catalog::load(config.resolved_catalog_path())?;
        let provider: Arc<dyn EmbeddingProvider> = Arc::from(
            crate::embedding::create_provider(&config.embedding)
                .context("failed to create embedding provider")?,
        );
        let store = store_from_config(config);
        Ok(Self::initialize(catalog, provider, &store)?)
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn matrix(&self) -> &EmbeddingMatrix {
        &self.matrix
    }

    pub fn cache_outcome(&self) -> &CacheOutcome {
        &self.cache_outcome
    }

    /// Rank the catalog against free-text quiz answers.
    pub fn recommend(
        &self,
        query_text: &str,
        top_n: usize,
    ) -> Result<Vec<ScoredResult>, RecommendError> {
        let query = self.encode_query(query_text)?;
        self.rank_vector(&query, top_n)
    }

    /// Embed query text with the same provider that built the matrix.
    pub fn encode_query(&self, query_text: &str) -> Result<Vec<f32>, RecommendError> {
        validate_query(query_text)?;
        self.provider
            .embed(query_text)
            .map_err(|e| RecommendError::EmbeddingUnavailable(format!("{e:#}")))
    }

    /// Rank the catalog against an already-encoded query.
    pub fn rank_vector(
        &self,
        query: &[f32],
        top_n: usize,
    ) -> Result<Vec<ScoredResult>, RecommendError> {
        if query.len() != self.matrix.dim() {
            return Err(RecommendError::EmbeddingUnavailable(format!(
                "query vector has {} dimensions, catalog vectors have {}",
                query.len(),
                self.matrix.dim()
            )));
        }
        Ok(rank::rank(query, &self.matrix, &self.catalog, top_n))
    }
}

/// The embedding store at the configured cache location.
pub fn store_from_config(config: &CareerMatchConfig) -> EmbeddingStore {
    EmbeddingStore::new(config.resolved_cache_db_path(), config.embedding.model.clone())
}

/// Reject empty or whitespace-only query text.
pub fn validate_query(query_text: &str) -> Result<(), RecommendError> {
    if query_text.trim().is_empty() {
        return Err(RecommendError::InvalidQuery("quiz answers must not be empty".into()));
    }
    Ok(())
}

/// Async request path: validate, embed on the blocking pool under `timeout`,
/// then rank.
pub async fn recommend_with_timeout(
    recommender: Arc<Recommender>,
    query_text: String,
    top_n: usize,
    timeout: Duration,
) -> Result<Vec<ScoredResult>, RecommendError> {
    validate_query(&query_text)?;

    let encoder = Arc::clone(&recommender);
    let task = tokio::task::spawn_blocking(move || encoder.encode_query(&query_text));
    let query = match tokio::time::timeout(timeout, task).await {
        Ok(joined) => joined
            .map_err(|e| RecommendError::EmbeddingUnavailable(format!("embedding task failed: {e}")))??,
        Err(_) => return Err(RecommendError::QueryTimeout(timeout.as_millis() as u64)),
    };

    recommender.rank_vector(&query, top_n)
}

/// One-shot initialization barrier shared by concurrent workers.
///
/// The first caller runs the (blocking) initializer; everyone else waits for
/// it and receives the same instance. A failed attempt leaves the cell empty.
#[derive(Default)]
pub struct RecommenderCell {
    cell: OnceCell<Arc<Recommender>>,
}

impl RecommenderCell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<Arc<Recommender>> {
        self.cell.get().cloned()
    }

    pub async fn get_or_init<F>(&self, init: F) -> anyhow::Result<Arc<Recommender>>
    where
        F: FnOnce() -> anyhow::Result<Recommender> + Send + 'static,
    {
        self.cell
            .get_or_try_init(|| async move {
                tokio::task::spawn_blocking(init)
                    .await
                    .context("initialization task failed")?
                    .map(Arc::new)
            })
            .await
            .cloned()
    }
}
