//! Semantic career recommendations from free-text quiz answers.
//!
//! CareerMatch embeds every career in a catalog (description, skills and
//! personality match) with a local sentence-embedding model, caches the vectors
//! on disk, and ranks careers against a user's quiz answers by cosine
//! similarity.
//!
//! # Architecture
//!
//! - **Catalog**: ordered careers loaded once from JSON, defaults applied at load time
//! - **Embeddings**: Local ONNX Runtime with all-MiniLM-L6-v2 (384 dimensions)
//! - **Cache**: SQLite file holding the matrix blob and the title list it was built from
//! - **Ranking**: cosine similarity, stable descending sort, top-K
//! - **Transport**: MCP over stdio (primary) or Streamable HTTP/SSE
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from TOML files and environment variables
//! - [`catalog`]: Career records and catalog loading
//! - [`db`]: SQLite cache database: schema, migrations, health checks
//! - [`embedding`]: Text-to-vector embedding pipeline via ONNX Runtime
//! - [`store`]: Embedding cache: load, validate, compute, persist
//! - [`recommend`]: The recommender service and similarity ranking
//! - [`error`]: Domain error type

pub mod catalog;
pub mod config;
pub mod db;
pub mod embedding;
pub mod error;
pub mod recommend;
pub mod store;

pub use error::RecommendError;
pub use recommend::{Recommender, ScoredResult};
