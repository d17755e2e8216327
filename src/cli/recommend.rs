//! CLI `recommend` command: one-shot recommendation from the terminal.

use anyhow::{Context, Result};
use serde::Serialize;

use crate::config::CareerMatchConfig;
use crate::recommend::{validate_query, Recommender, ScoredResult};

#[derive(Serialize)]
struct RecommendOutput<'a> {
    recommendations: &'a [ScoredResult],
}

/// Rank the catalog against `query` and print the matches.
pub async fn recommend(
    config: &CareerMatchConfig,
    query: &str,
    top_n: Option<i64>,
    json: bool,
) -> Result<()> {
    // Fail before the (slow) model load on an empty query.
    validate_query(query)?;
    let top_n = config.effective_top_n(top_n);

    let owned_config = config.clone();
    let recommender = tokio::task::spawn_blocking(move || Recommender::from_config(&owned_config))
        .await?
        .context("failed to initialize recommender")?;

    let query_text = query.to_string();
    let results =
        tokio::task::spawn_blocking(move || recommender.recommend(&query_text, top_n)).await??;

    if json {
        let output = RecommendOutput {
            recommendations: &results,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if results.is_empty() {
        println!("No recommendations.");
        return Ok(());
    }

    println!("Top {} career match(es)\n", results.len());
    for (i, result) in results.iter().enumerate() {
        println!(
            "  {}. {} (score: {:.4})",
            i + 1,
            result.title,
            result.similarity_score
        );
        if !result.education_required.is_empty() {
            println!("     Education: {}", result.education_required);
        }
        if result.average_salary > 0.0 {
            println!("     Average salary: ${:.0}", result.average_salary);
        }
        if !result.job_outlook.is_empty() {
            println!("     Outlook: {}", result.job_outlook);
        }
        println!("     {}", preview(&result.description, 120));
        println!();
    }

    Ok(())
}

fn preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{cut}...")
    } else {
        text.to_string()
    }
}
