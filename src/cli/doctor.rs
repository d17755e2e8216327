//! CLI `doctor` command: check catalog, model files and cache, print a report.

use anyhow::{Context, Result};

use crate::catalog::Catalog;
use crate::config::CareerMatchConfig;
use crate::db;
use crate::embedding::local::model_files;
use crate::recommend::store_from_config;

pub fn doctor(config: &CareerMatchConfig) -> Result<()> {
    println!("CareerMatch Health Report");
    println!("=========================");
    println!();

    let catalog_path = config.resolved_catalog_path();
    let catalog_len = match Catalog::load(&catalog_path) {
        Ok(catalog) => {
            println!("Catalog:           {} ({} careers)", catalog_path.display(), catalog.len());
            if catalog.is_empty() {
                println!("  WARNING: catalog is empty; the recommender will refuse to start.");
            }
            Some(catalog.len())
        }
        Err(e) => {
            println!("Catalog:           UNAVAILABLE ({e:#})");
            None
        }
    };

    let (model_path, tokenizer_path) = model_files(&config.embedding);
    println!();
    println!("Embedding model:   {}", config.embedding.model);
    println!("  model.onnx:      {}", presence(model_path.exists()));
    println!("  tokenizer.json:  {}", presence(tokenizer_path.exists()));
    if !model_path.exists() || !tokenizer_path.exists() {
        println!("  Run `careermatch model download` to fetch them.");
    }

    let db_path = config.resolved_cache_db_path();
    println!();
    if !db_path.exists() {
        println!("Cache:             not built at {}", db_path.display());
        println!("  Run `careermatch embed` to build it.");
        return Ok(());
    }

    let file_size = std::fs::metadata(&db_path).map(|m| m.len()).unwrap_or(0);
    let conn = db::open_database(&db_path).context("failed to open cache (may be corrupt)")?;
    let report = db::check_database_health(&conn).context("failed to run health check")?;
    drop(conn);

    println!("Cache:             {}", db_path.display());
    println!("File size:         {}", format_bytes(file_size));
    println!("Schema version:    {}", report.schema_version);

    match store_from_config(config).status()? {
        None => println!("Cached rows:       none"),
        Some(status) => {
            println!("Cached rows:       {} x {} dims", status.rows, status.dim);
            println!("Built at:          {}", status.built_at);
            println!(
                "Stored model:      {}",
                status.model.as_deref().unwrap_or("(not set)")
            );
            if status.model.as_deref().is_some_and(|m| m != config.embedding.model) {
                println!("  WARNING: model mismatch! Run `careermatch embed --force`.");
            }
            match catalog_len {
                Some(n) if n == status.rows => println!("Staleness:         OK (row count matches)"),
                Some(n) => println!(
                    "Staleness:         STALE ({} cached, {n} in catalog; will recompute)",
                    status.rows
                ),
                None => {}
            }
        }
    }

    println!();
    if report.integrity_ok {
        println!("Integrity check:   PASSED");
    } else {
        println!("Integrity check:   FAILED ({})", report.integrity_details);
        println!("  Run `careermatch cache clear` then `careermatch embed` to rebuild.");
    }

    Ok(())
}

fn presence(found: bool) -> &'static str {
    if found {
        "found"
    } else {
        "MISSING"
    }
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
