//! Cosine-similarity ranking over the embedding matrix.
//!
//! Pure functions of their inputs. Zero-norm vectors score 0, ties keep catalog
//! order, and the result is always `min(k, catalog.len())` long.

use std::cmp::Ordering;

use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, CatalogItem};
use crate::store::EmbeddingMatrix;

/// A catalog entry with its similarity to the query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredResult {
    #[serde(rename = "career_title")]
    pub title: String,
    pub description: String,
    pub skills: String,
    pub personality_match: String,
    pub education_required: String,
    #[serde(rename = "average_salary_usd")]
    pub average_salary: f64,
    pub job_outlook: String,
    pub learning_resources: String,
    pub similarity_score: f32,
}

impl ScoredResult {
    fn from_item(item: &CatalogItem, similarity_score: f32) -> Self {
        Self {
            title: item.title.clone(),
            description: item.description.clone(),
            skills: item.skills.clone(),
            personality_match: item.personality_match.clone(),
            education_required: item.education_required.clone(),
            average_salary: item.average_salary,
            job_outlook: item.job_outlook.clone(),
            learning_resources: item.learning_resources.clone(),
            similarity_score,
        }
    }
}

/// `dot(a, b) / (|a| * |b|)`, or 0 when either norm is zero, the lengths
/// differ, or the result is not finite.
pub fn cosine_similarity(a: ArrayView1<'_, f32>, b: ArrayView1<'_, f32>) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let norm_a = a.dot(&a).sqrt();
    let norm_b = b.dot(&b).sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    let score = a.dot(&b) / (norm_a * norm_b);
    if score.is_finite() {
        score
    } else {
        0.0
    }
}

/// Score every row against `query` in catalog order.
pub fn score_all(query: &[f32], matrix: &EmbeddingMatrix) -> Vec<f32> {
    let q = ArrayView1::from(query);
    matrix
        .view()
        .rows()
        .into_iter()
        .map(|row| cosine_similarity(q, row))
        .collect()
}

/// Top-`k` catalog entries by descending cosine similarity to `query`.
pub fn rank(
    query: &[f32],
    matrix: &EmbeddingMatrix,
    catalog: &Catalog,
    k: usize,
) -> Vec<ScoredResult> {
    if k == 0 {
        return Vec::new();
    }

    let mut scored: Vec<(usize, f32)> = score_all(query, matrix)
        .into_iter()
        .take(catalog.len())
        .enumerate()
        .collect();

    // Stable: equal scores keep catalog order.
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    scored.truncate(k);

    scored
        .into_iter()
        .filter_map(|(index, score)| {
            catalog
                .get(index)
                .map(|item| ScoredResult::from_item(item, score))
        })
        .collect()
}
