//! Embedding store: computes, persists and reloads the catalog's vectors.
//!
//! [`EmbeddingStore::initialize`] is the single entry point used at startup. It
//! reads the persisted cache and accepts it only when its row count equals the
//! live catalog size. On any miss it embeds every career's combined text in one
//! batch call and writes the matrix and the ordered title list together in a
//! single transaction.
//!
//! Load failures are never errors: they become a [`CacheMiss`] and trigger a
//! recompute. Write failures become a [`PersistenceWarning`]; the freshly
//! computed matrix is still returned and serves the current process. A cache
//! file SQLite cannot read as a database is replaced on the next write.

pub mod matrix;

use anyhow::{Context, Result};
use rusqlite::{params, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

use crate::catalog::Catalog;
use crate::db;
use crate::embedding::EmbeddingProvider;
use crate::error::RecommendError;

pub use matrix::EmbeddingMatrix;

/// Persisted matrix plus the titles it was built from.
#[derive(Debug, Clone)]
pub struct CacheRecord {
    pub matrix: EmbeddingMatrix,
    pub titles: Vec<String>,
    pub model: Option<String>,
    pub built_at: String,
}

/// Why a persisted cache was not used.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CacheMiss {
    #[error("no cached embeddings")]
    Absent,
    #[error("cached embeddings unreadable: {0}")]
    Unreadable(String),
    #[error("cache holds {cached} rows but catalog has {catalog} careers")]
    SizeMismatch { cached: usize, catalog: usize },
    #[error("cache vectors have {cached} dimensions but provider produces {provider}")]
    DimensionMismatch { cached: usize, provider: usize },
}

/// A failed cache write. The in-memory matrix stays valid.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("failed to persist embeddings: {message}")]
pub struct PersistenceWarning {
    pub message: String,
}

/// How the matrix for this process was obtained.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheOutcome {
    Hit,
    Miss(CacheMiss),
    /// Recomputed on request, ignoring any existing cache.
    Rebuilt,
}

/// Result of store initialization.
#[derive(Debug)]
pub struct Initialized {
    pub matrix: EmbeddingMatrix,
    pub outcome: CacheOutcome,
    pub persistence: Option<PersistenceWarning>,
}

/// Summary of what is on disk, for diagnostics.
#[derive(Debug, Clone)]
pub struct CacheStatus {
    pub rows: usize,
    pub dim: usize,
    pub model: Option<String>,
    pub built_at: String,
}

/// Owns the on-disk cache location and serializes initialization.
pub struct EmbeddingStore {
    db_path: PathBuf,
    model: String,
    init_guard: Mutex<()>,
}

impl EmbeddingStore {
    /// `model` identifies the provider's model and is recorded with the cache.
    pub fn new(db_path: impl Into<PathBuf>, model: impl Into<String>) -> Self {
        Self {
            db_path: db_path.into(),
            model: model.into(),
            init_guard: Mutex::new(()),
        }
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Load the cache if valid for `catalog`, otherwise embed and persist.
    pub fn initialize(
        &self,
        catalog: &Catalog,
        provider: &dyn EmbeddingProvider,
    ) -> Result<Initialized, RecommendError> {
        if catalog.is_empty() {
            return Err(RecommendError::EmptyCatalog);
        }
        let _guard = self.init_guard.lock().unwrap_or_else(|e| e.into_inner());

        let miss = match self.read_cache() {
            Ok(record) => match self.validate(&record, catalog, provider) {
                Ok(()) => {
                    tracing::info!(
                        rows = record.matrix.rows(),
                        dim = record.matrix.dim(),
                        built_at = %record.built_at,
                        "loaded cached career embeddings"
                    );
                    return Ok(Initialized {
                        matrix: record.matrix,
                        outcome: CacheOutcome::Hit,
                        persistence: None,
                    });
                }
                Err(miss) => miss,
            },
            Err(miss) => miss,
        };

        tracing::info!(reason = %miss, "embedding cache miss, recomputing");
        let (matrix, persistence) = self.compute_and_persist_locked(catalog, provider)?;
        Ok(Initialized {
            matrix,
            outcome: CacheOutcome::Miss(miss),
            persistence,
        })
    }

    /// Recompute and persist regardless of any existing cache.
    pub fn rebuild(
        &self,
        catalog: &Catalog,
        provider: &dyn EmbeddingProvider,
    ) -> Result<Initialized, RecommendError> {
        if catalog.is_empty() {
            return Err(RecommendError::EmptyCatalog);
        }
        let _guard = self.init_guard.lock().unwrap_or_else(|e| e.into_inner());
        let (matrix, persistence) = self.compute_and_persist_locked(catalog, provider)?;
        Ok(Initialized {
            matrix,
            outcome: CacheOutcome::Rebuilt,
            persistence,
        })
    }

    /// Read the persisted artifacts. `None` if absent or unreadable.
    pub fn load_cache(&self) -> Option<CacheRecord> {
        match self.read_cache() {
            Ok(record) => Some(record),
            Err(miss) => {
                tracing::debug!(reason = %miss, "no usable embedding cache");
                None
            }
        }
    }

    /// Embed every career in one batch call and write the result to disk.
    pub fn compute_and_persist(
        &self,
        catalog: &Catalog,
        provider: &dyn EmbeddingProvider,
    ) -> Result<(EmbeddingMatrix, Option<PersistenceWarning>), RecommendError> {
        if catalog.is_empty() {
            return Err(RecommendError::EmptyCatalog);
        }
        let _guard = self.init_guard.lock().unwrap_or_else(|e| e.into_inner());
        self.compute_and_persist_locked(catalog, provider)
    }

    /// Delete the persisted artifacts. Returns `false` if there was nothing to delete.
    pub fn clear(&self) -> Result<bool> {
        if !self.db_path.exists() {
            return Ok(false);
        }
        let mut conn = match db::open_database(&self.db_path) {
            Ok(conn) => conn,
            Err(e) if is_damaged_database(&e) => {
                self.remove_files()?;
                tracing::info!(path = %self.db_path.display(), "damaged embedding cache removed");
                return Ok(true);
            }
            Err(e) => return Err(e),
        };
        let tx = conn.transaction()?;
        let removed = tx.execute("DELETE FROM embedding_matrix", [])?;
        tx.execute("DELETE FROM career_titles", [])?;
        tx.execute("DELETE FROM schema_meta WHERE key = 'embedding_model'", [])?;
        tx.commit()?;
        tracing::info!(path = %self.db_path.display(), "embedding cache cleared");
        Ok(removed > 0)
    }

    /// Describe the persisted cache without loading the vectors into a matrix.
    pub fn status(&self) -> Result<Option<CacheStatus>> {
        if !self.db_path.exists() {
            return Ok(None);
        }
        let conn = db::open_database(&self.db_path)?;
        let row = conn
            .query_row(
                "SELECT row_count, dim, built_at FROM embedding_matrix WHERE id = 1",
                [],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                },
            )
            .optional()?;
        let model = db::migrations::get_embedding_model(&conn)?;
        Ok(row.map(|(rows, dim, built_at)| CacheStatus {
            rows: usize::try_from(rows).unwrap_or(0),
            dim: usize::try_from(dim).unwrap_or(0),
            model,
            built_at,
        }))
    }

    fn validate(
        &self,
        record: &CacheRecord,
        catalog: &Catalog,
        provider: &dyn EmbeddingProvider,
    ) -> Result<(), CacheMiss> {
        if record.matrix.rows() != catalog.len() {
            return Err(CacheMiss::SizeMismatch {
                cached: record.matrix.rows(),
                catalog: catalog.len(),
            });
        }
        if record.matrix.dim() != provider.dimensions() {
            return Err(CacheMiss::DimensionMismatch {
                cached: record.matrix.dim(),
                provider: provider.dimensions(),
            });
        }
        if let Some(stored) = record.model.as_deref() {
            if stored != self.model {
                tracing::warn!(
                    stored = %stored,
                    configured = %self.model,
                    "embedding model changed: run `careermatch embed --force` to rebuild the cache"
                );
            }
        }
        Ok(())
    }

    fn read_cache(&self) -> Result<CacheRecord, CacheMiss> {
        if !self.db_path.exists() {
            return Err(CacheMiss::Absent);
        }
        let conn = db::open_database(&self.db_path)
            .map_err(|e| CacheMiss::Unreadable(format!("{e:#}")))?;
        read_record(&conn).map_err(|e| CacheMiss::Unreadable(e.to_string()))?
    }

    fn compute_and_persist_locked(
        &self,
        catalog: &Catalog,
        provider: &dyn EmbeddingProvider,
    ) -> Result<(EmbeddingMatrix, Option<PersistenceWarning>), RecommendError> {
        tracing::info!(careers = catalog.len(), "computing career embeddings");
        let matrix = embed_catalog(catalog, provider)?;

        let persistence = match self.persist(&matrix, &catalog.titles()) {
            Ok(()) => {
                tracing::info!(
                    rows = matrix.rows(),
                    path = %self.db_path.display(),
                    "saved career embeddings to cache"
                );
                None
            }
            Err(e) => {
                let warning = PersistenceWarning {
                    message: format!("{e:#}"),
                };
                tracing::warn!(error = %warning, "embedding cache not saved; continuing with in-memory vectors");
                Some(warning)
            }
        };

        Ok((matrix, persistence))
    }

    /// Write matrix and titles as one unit.
    fn persist(&self, matrix: &EmbeddingMatrix, titles: &[String]) -> Result<()> {
        let mut conn = self.open_or_reset()?;
        let tx = conn.transaction().context("failed to begin cache write")?;

        tx.execute("DELETE FROM career_titles", [])?;
        tx.execute(
            "INSERT OR REPLACE INTO embedding_matrix (id, row_count, dim, vectors, built_at)
             VALUES (1, ?1, ?2, ?3, ?4)",
            params![
                matrix.rows() as i64,
                matrix.dim() as i64,
                matrix.to_le_bytes(),
                chrono::Utc::now().to_rfc3339(),
            ],
        )?;
        {
            let mut stmt =
                tx.prepare("INSERT INTO career_titles (position, title) VALUES (?1, ?2)")?;
            for (position, title) in titles.iter().enumerate() {
                stmt.execute(params![position as i64, title])?;
            }
        }
        db::migrations::set_embedding_model(&tx, &self.model)?;

        tx.commit().context("failed to commit cache write")?;
        Ok(())
    }

    /// Open the cache database for writing. A file SQLite cannot read as a
    /// database is deleted and recreated.
    fn open_or_reset(&self) -> Result<rusqlite::Connection> {
        match db::open_database(&self.db_path) {
            Ok(conn) => Ok(conn),
            Err(e) if is_damaged_database(&e) => {
                tracing::warn!(
                    path = %self.db_path.display(),
                    error = %format!("{e:#}"),
                    "cache file is not a usable database; replacing it"
                );
                self.remove_files()?;
                db::open_database(&self.db_path)
            }
            Err(e) => Err(e),
        }
    }

    /// Delete the database file and its WAL sidecars.
    fn remove_files(&self) -> Result<()> {
        for path in [
            self.db_path.clone(),
            sidecar(&self.db_path, "-wal"),
            sidecar(&self.db_path, "-shm"),
        ] {
            match std::fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(e)
                        .with_context(|| format!("failed to remove {}", path.display()))
                }
            }
        }
        Ok(())
    }
}

fn sidecar(db_path: &Path, suffix: &str) -> PathBuf {
    let mut name = db_path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

/// `true` when SQLite rejected the file itself (NOTADB or CORRUPT), as opposed
/// to a permission or I/O problem.
fn is_damaged_database(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        matches!(
            cause.downcast_ref::<rusqlite::Error>(),
            Some(rusqlite::Error::SqliteFailure(failure, _))
                if matches!(
                    failure.code,
                    rusqlite::ErrorCode::NotADatabase | rusqlite::ErrorCode::DatabaseCorrupt
                )
        )
    })
}

/// Embed all combined texts with one provider call. Never returns a partial matrix.
pub fn embed_catalog(
    catalog: &Catalog,
    provider: &dyn EmbeddingProvider,
) -> Result<EmbeddingMatrix, RecommendError> {
    let texts = catalog.combined_texts();
    let refs: Vec<&str> = texts.iter().map(String::as_str).collect();

    let vectors = provider
        .embed_batch(&refs)
        .map_err(|e| RecommendError::EmbeddingUnavailable(format!("{e:#}")))?;

    if vectors.len() != refs.len() {
        return Err(RecommendError::EmbeddingUnavailable(format!(
            "provider returned {} vectors for {} careers",
            vectors.len(),
            refs.len()
        )));
    }
    EmbeddingMatrix::from_rows(vectors)
}

/// Read both artifacts. The outer error is a storage failure, the inner one a
/// well-formed database that holds no usable cache.
fn read_record(conn: &rusqlite::Connection) -> rusqlite::Result<Result<CacheRecord, CacheMiss>> {
    let row = conn
        .query_row(
            "SELECT row_count, dim, vectors, built_at FROM embedding_matrix WHERE id = 1",
            [],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, Vec<u8>>(2)?,
                    row.get::<_, String>(3)?,
                ))
            },
        )
        .optional()?;

    let Some((rows, dim, blob, built_at)) = row else {
        return Ok(Err(CacheMiss::Absent));
    };

    let titles: Vec<String> = conn
        .prepare("SELECT title FROM career_titles ORDER BY position")?
        .query_map([], |row| row.get(0))?
        .collect::<Result<Vec<_>, _>>()?;
    let model = db::migrations::get_embedding_model(conn)?;

    let (Ok(rows), Ok(dim)) = (usize::try_from(rows), usize::try_from(dim)) else {
        return Ok(Err(CacheMiss::Unreadable("negative matrix shape".into())));
    };
    if titles.len() != rows {
        return Ok(Err(CacheMiss::Unreadable(format!(
            "matrix has {rows} rows but {} titles are stored",
            titles.len()
        ))));
    }
    let Some(matrix) = EmbeddingMatrix::from_le_bytes(rows, dim, &blob) else {
        return Ok(Err(CacheMiss::Unreadable(format!(
            "vector blob of {} bytes does not match {rows}x{dim}",
            blob.len()
        ))));
    };

    Ok(Ok(CacheRecord {
        matrix,
        titles,
        model,
        built_at,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogItem;

    struct Axis3;

    impl EmbeddingProvider for Axis3 {
        fn embed_batch(&self, texts: &[&str]) -> anyhow::Result<Vec<Vec<f32>>> {
            Ok(texts
                .iter()
                .map(|t| vec![t.len() as f32, 1.0, 0.0])
                .collect())
        }

        fn dimensions(&self) -> usize {
            3
        }
    }

    fn catalog(titles: &[&str]) -> Catalog {
        Catalog::new(
            titles
                .iter()
                .map(|t| CatalogItem {
                    title: t.to_string(),
                    description: format!("{t} work"),
                    ..Default::default()
                })
                .collect(),
        )
    }

    #[test]
    fn read_record_on_empty_db_is_absent() {
        let conn = db::open_memory_database().unwrap();
        assert_eq!(read_record(&conn).unwrap().unwrap_err(), CacheMiss::Absent);
    }

    #[test]
    fn titles_out_of_step_with_matrix_are_unreadable() {
        let tmp = tempfile::TempDir::new().unwrap();
        let store = EmbeddingStore::new(tmp.path().join("cache.db"), "test-model");
        let catalog = catalog(&["Linguist", "Curator"]);
        store.initialize(&catalog, &Axis3).unwrap();

        let conn = db::open_database(store.db_path()).unwrap();
        conn.execute("DELETE FROM career_titles WHERE position = 1", [])
            .unwrap();

        assert!(matches!(
            read_record(&conn).unwrap(),
            Err(CacheMiss::Unreadable(_))
        ));
        assert!(store.load_cache().is_none());
    }

    #[test]
    fn status_reports_persisted_shape() {
        let tmp = tempfile::TempDir::new().unwrap();
        let store = EmbeddingStore::new(tmp.path().join("cache.db"), "test-model");
        assert!(store.status().unwrap().is_none());

        store.initialize(&catalog(&["Animator"]), &Axis3).unwrap();

        let status = store.status().unwrap().unwrap();
        assert_eq!(status.rows, 1);
        assert_eq!(status.dim, 3);
        assert_eq!(status.model.as_deref(), Some("test-model"));
    }

    #[test]
    fn clear_removes_cache() {
        let tmp = tempfile::TempDir::new().unwrap();
        let store = EmbeddingStore::new(tmp.path().join("cache.db"), "test-model");
        assert!(!store.clear().unwrap());

        store.initialize(&catalog(&["Animator"]), &Axis3).unwrap();
        assert!(store.clear().unwrap());
        assert!(store.load_cache().is_none());
    }

    #[test]
    fn garbage_file_is_recognised_as_damaged() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("cache.db");
        std::fs::write(&path, "plain text, not sqlite ".repeat(100)).unwrap();

        let err = db::open_database(&path).unwrap_err();
        assert!(is_damaged_database(&err));

        let missing_dir = tmp.path().join("file-parent");
        std::fs::write(&missing_dir, b"x").unwrap();
        let err = db::open_database(missing_dir.join("cache.db")).unwrap_err();
        assert!(!is_damaged_database(&err));
    }

    #[test]
    fn sidecar_paths_append_suffix() {
        assert_eq!(
            sidecar(Path::new("/tmp/cache.db"), "-wal"),
            PathBuf::from("/tmp/cache.db-wal")
        );
    }

    #[test]
    fn dimension_change_forces_recompute() {
        struct Axis2;
        impl EmbeddingProvider for Axis2 {
            fn embed_batch(&self, texts: &[&str]) -> anyhow::Result<Vec<Vec<f32>>> {
                Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
            }
            fn dimensions(&self) -> usize {
                2
            }
        }

        let tmp = tempfile::TempDir::new().unwrap();
        let store = EmbeddingStore::new(tmp.path().join("cache.db"), "test-model");
        let catalog = catalog(&["Animator"]);
        store.initialize(&catalog, &Axis3).unwrap();

        let init = store.initialize(&catalog, &Axis2).unwrap();
        assert_eq!(
            init.outcome,
            CacheOutcome::Miss(CacheMiss::DimensionMismatch {
                cached: 3,
                provider: 2
            })
        );
        assert_eq!(init.matrix.dim(), 2);
    }
}
