mod helpers;

use std::sync::Arc;

use careermatch::catalog::Catalog;
use careermatch::embedding::EmbeddingProvider;
use careermatch::store::EmbeddingStore;
use careermatch::{RecommendError, Recommender};
use helpers::{career, three_careers, CountingProvider, FailingProvider, MisalignedProvider};
use tempfile::TempDir;

fn recommender_with(
    catalog: Catalog,
    provider: Arc<CountingProvider>,
) -> (Recommender, TempDir) {
    let tmp = TempDir::new().unwrap();
    let store = EmbeddingStore::new(tmp.path().join("cache.db"), "bag-of-words");
    let recommender = Recommender::initialize(catalog, provider, &store).unwrap();
    (recommender, tmp)
}

#[test]
fn closest_career_ranks_first() {
    let (recommender, _tmp) = recommender_with(three_careers(), Arc::new(CountingProvider::new()));

    let results = recommender
        .recommend("I love data, statistics and python, plus a little design", 2)
        .unwrap();

    let titles: Vec<&str> = results.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, vec!["Data Scientist", "UX Designer"]);
    assert!(results[0].similarity_score > results[1].similarity_score);
}

#[test]
fn empty_query_is_rejected_before_embedding() {
    let provider = Arc::new(CountingProvider::new());
    let (recommender, _tmp) = recommender_with(three_careers(), Arc::clone(&provider));
    let calls_after_init = provider.batch_calls();

    for query in ["", "   \n"] {
        let err = recommender.recommend(query, 5).unwrap_err();
        assert!(matches!(err, RecommendError::InvalidQuery(_)));
        assert!(err.is_client_error());
    }
    assert_eq!(provider.batch_calls(), calls_after_init);
}

#[test]
fn identical_embeddings_keep_catalog_order() {
    let catalog = Catalog::new(vec![
        career("Network Engineer", "network router", "security", ""),
        career("Data Analyst", "data", "", ""),
        career("Data Scientist", "data", "", ""),
    ]);
    let (recommender, _tmp) = recommender_with(catalog, Arc::new(CountingProvider::new()));

    let results = recommender.recommend("data", 3).unwrap();
    let titles: Vec<&str> = results.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, vec!["Data Analyst", "Data Scientist", "Network Engineer"]);
    assert_eq!(results[0].similarity_score, results[1].similarity_score);
}

#[test]
fn recommendations_are_deterministic() {
    let (recommender, _tmp) = recommender_with(three_careers(), Arc::new(CountingProvider::new()));
    let query = "security for user prototype networks";

    let first = recommender.recommend(query, 3).unwrap();
    for _ in 0..5 {
        assert_eq!(recommender.recommend(query, 3).unwrap(), first);
    }
}

#[test]
fn result_length_is_min_of_k_and_catalog() {
    let (recommender, _tmp) = recommender_with(three_careers(), Arc::new(CountingProvider::new()));

    for k in 0..=6 {
        let results = recommender.recommend("data design network", k).unwrap();
        assert_eq!(results.len(), k.min(3), "k = {k}");
    }
    assert!(recommender.recommend("data", 0).unwrap().is_empty());
}

#[test]
fn scores_are_non_increasing() {
    let (recommender, _tmp) = recommender_with(helpers::catalog_of(10), Arc::new(CountingProvider::new()));

    let results = recommender.recommend("python design security router", 10).unwrap();
    assert_eq!(results.len(), 10);
    for pair in results.windows(2) {
        assert!(pair[0].similarity_score >= pair[1].similarity_score);
    }
}

#[test]
fn query_with_no_known_words_scores_zero_without_nan() {
    let (recommender, _tmp) = recommender_with(three_careers(), Arc::new(CountingProvider::new()));

    let results = recommender.recommend("gardening and pottery", 3).unwrap();
    assert_eq!(results.len(), 3);
    assert!(results.iter().all(|r| r.similarity_score == 0.0));
    assert_eq!(results[0].title, "Data Scientist");
}

#[test]
fn results_carry_catalog_fields() {
    let (recommender, _tmp) = recommender_with(three_careers(), Arc::new(CountingProvider::new()));

    let top = &recommender.recommend("router", 1).unwrap()[0];
    assert_eq!(top.title, "Network Engineer");
    assert_eq!(top.description, "network router");
    assert_eq!(top.skills, "security");
    assert_eq!(top.education_required, "Bachelor's");
    assert_eq!(top.average_salary, 90_000.0);
    assert_eq!(top.learning_resources, "[]");
}

#[test]
fn empty_catalog_fails_initialization() {
    let tmp = TempDir::new().unwrap();
    let store = EmbeddingStore::new(tmp.path().join("cache.db"), "bag-of-words");
    let provider = Arc::new(CountingProvider::new());

    let err = Recommender::initialize(Catalog::default(), provider.clone(), &store).unwrap_err();
    assert!(matches!(err, RecommendError::EmptyCatalog));
    assert_eq!(provider.batch_calls(), 0);
    assert!(!store.db_path().exists());
}

#[test]
fn embedding_failure_is_fatal_and_writes_nothing() {
    let tmp = TempDir::new().unwrap();
    let store = EmbeddingStore::new(tmp.path().join("cache.db"), "bag-of-words");

    let provider: Arc<dyn EmbeddingProvider> = Arc::new(FailingProvider);
    let err = Recommender::initialize(three_careers(), provider, &store).unwrap_err();
    assert!(matches!(err, RecommendError::EmbeddingUnavailable(_)));
    assert!(store.load_cache().is_none());
}

#[test]
fn misaligned_provider_output_is_rejected() {
    let tmp = TempDir::new().unwrap();
    let store = EmbeddingStore::new(tmp.path().join("cache.db"), "bag-of-words");

    let provider: Arc<dyn EmbeddingProvider> = Arc::new(MisalignedProvider);
    let err = Recommender::initialize(three_careers(), provider, &store).unwrap_err();
    match err {
        RecommendError::EmbeddingUnavailable(msg) => assert!(msg.contains("2 vectors for 3")),
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(store.load_cache().is_none());
}

#[test]
fn rank_vector_rejects_wrong_dimension() {
    let (recommender, _tmp) = recommender_with(three_careers(), Arc::new(CountingProvider::new()));
    let err = recommender.rank_vector(&[1.0, 0.0], 3).unwrap_err();
    assert!(matches!(err, RecommendError::EmbeddingUnavailable(_)));
}

#[test]
fn results_serialize_in_api_shape() {
    let (recommender, _tmp) = recommender_with(three_careers(), Arc::new(CountingProvider::new()));
    let results = recommender.recommend("design", 1).unwrap();

    let json = serde_json::to_value(&results).unwrap();
    assert_eq!(json[0]["career_title"], "UX Designer");
    assert_eq!(json[0]["average_salary_usd"], 90_000.0);
    assert!(json[0]["similarity_score"].as_f64().unwrap() > 0.0);
}
