//! Domain errors for the recommender.
//!
//! Cache misses and persistence problems are not errors here: a miss is a
//! [`crate::store::CacheMiss`] reason and a failed write is a
//! [`crate::store::PersistenceWarning`], neither of which fails a call.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecommendError {
    /// The catalog had no careers; there is nothing to embed or rank.
    #[error("career catalog is empty")]
    EmptyCatalog,

    /// The embedding provider failed or returned malformed output.
    #[error("embedding unavailable: {0}")]
    EmbeddingUnavailable(String),

    /// The query text was rejected before embedding.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// The query embedding did not finish within the request timeout.
    #[error("query embedding timed out after {0} ms")]
    QueryTimeout(u64),
}

impl RecommendError {
    /// `true` for errors caused by the caller's input rather than the service.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidQuery(_))
    }
}
