//! SQL DDL for the embedding cache.
//!
//! Two paired artifacts live side by side: `embedding_matrix` holds the dense
//! vector blob (a single row), `career_titles` holds the catalog order it was
//! built from. `schema_meta` tracks schema version and embedding model. All
//! DDL uses `IF NOT EXISTS` for idempotent initialization.

use rusqlite::Connection;

const SCHEMA_SQL: &str = r#"
-- Dense row-major f32 matrix, little-endian. Exactly one row when populated.
CREATE TABLE IF NOT EXISTS embedding_matrix (
    id INTEGER PRIMARY KEY CHECK(id = 1),
    row_count INTEGER NOT NULL CHECK(row_count >= 0),
    dim INTEGER NOT NULL CHECK(dim >= 0),
    vectors BLOB NOT NULL,
    built_at TEXT NOT NULL
);

-- Catalog titles in the order the matrix rows were produced
CREATE TABLE IF NOT EXISTS career_titles (
    position INTEGER PRIMARY KEY,
    title TEXT NOT NULL
);

-- Schema metadata
CREATE TABLE IF NOT EXISTS schema_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

/// Initialize all schema tables. Idempotent (uses IF NOT EXISTS).
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;

    // Set initial schema version if not already present
    conn.execute(
        "INSERT OR IGNORE INTO schema_meta (key, value) VALUES ('schema_version', '1')",
        [],
    )?;

    Ok(())
}
