use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::{json, Value};
use tower::ServiceExt;

use knowledge_cell::{knowledge_routes, Document, KnowledgeBase};

fn write_seed(dir: &std::path::Path) {
    std::fs::write(
        dir.join("disease_symptoms.json"),
        json!([
            {"content": "Malaria: high fever, chills, sweating, headache", "source": "WHO"},
            {"content": "Common cold: runny nose, sneezing, sore throat"}
        ])
        .to_string(),
    )
    .unwrap();
    std::fs::write(
        dir.join("health_tips.json"),
        json!({"tips": [{"tip": "Sleep seven to nine hours each night"}]}).to_string(),
    )
    .unwrap();
}

#[tokio::test]
async fn seeds_and_persists_when_store_missing() {
    let dir = tempfile::tempdir().unwrap();
    write_seed(dir.path());
    let store_path = dir.path().join("kb").join("knowledge_base.json");

    let kb = KnowledgeBase::open(&store_path, dir.path()).unwrap();
    assert_eq!(kb.len().await, 3);
    assert!(store_path.exists());

    let stats = kb.stats().await;
    assert_eq!(stats.total_documents, 3);
    assert_eq!(stats.categories["diseases"], 2);
    assert_eq!(stats.categories["health_tips"], 1);
    let order: Vec<_> = stats.categories.keys().map(String::as_str).collect();
    assert_eq!(order, vec!["diseases", "health_tips"]);
    assert_eq!(stats.database_path, store_path.display().to_string());
}

#[tokio::test]
async fn persisted_store_wins_over_seed_files() {
    let dir = tempfile::tempdir().unwrap();
    write_seed(dir.path());
    let store_path = dir.path().join("knowledge_base.json");
    std::fs::write(
        &store_path,
        json!([{"id": "custom", "content": "Only this document", "category": "general"}]).to_string(),
    )
    .unwrap();

    let kb = KnowledgeBase::open(&store_path, dir.path()).unwrap();
    assert_eq!(kb.len().await, 1);
}

#[tokio::test]
async fn upsert_replaces_and_survives_reload() {
    let dir = tempfile::tempdir().unwrap();
    let store_path = dir.path().join("knowledge_base.json");
    let kb = KnowledgeBase::with_documents(&store_path, Vec::new());

    kb.add_document("bp", "Blood pressure basics", "general").await.unwrap();
    kb.add_document("bp", "Normal blood pressure is below 120/80", "cardiology").await.unwrap();
    assert_eq!(kb.len().await, 1);

    let reloaded = KnowledgeBase::open(&store_path, dir.path()).unwrap();
    let hits = reloaded.query("blood pressure", 1).await;
    assert_eq!(hits[0].content, "Normal blood pressure is below 120/80");
    assert_eq!(hits[0].metadata.category, "cardiology");
}

#[tokio::test]
async fn stats_list_categories_in_first_seen_order() {
    let dir = tempfile::tempdir().unwrap();
    let kb = KnowledgeBase::with_documents(
        dir.path().join("knowledge_base.json"),
        vec![
            Document::new("p0", "Vitamin D supplement", "products"),
            Document::new("d0", "Measles causes a rash", "diseases"),
            Document::new("p1", "Digital thermometer", "products"),
        ],
    );

    let stats = kb.stats().await;
    let order: Vec<_> = stats.categories.keys().map(String::as_str).collect();
    assert_eq!(order, vec!["products", "diseases"]);
    assert_eq!(stats.categories["products"], 2);
}

#[tokio::test]
async fn failed_write_leaves_documents_untouched() {
    let dir = tempfile::tempdir().unwrap();
    // A directory in place of the store file makes every write fail.
    let store_path = dir.path().join("knowledge_base.json");
    std::fs::create_dir(&store_path).unwrap();

    let kb = KnowledgeBase::with_documents(
        &store_path,
        vec![Document::new("a", "Wash your hands often", "health_tips")],
    );

    assert!(kb.add_document("b", "Brand new tip about sleep", "health_tips").await.is_err());
    assert!(kb.add_document("a", "Replaced content", "general").await.is_err());
    assert_eq!(kb.len().await, 1);
    let hits = kb.query("wash your hands often", 5).await;
    assert_eq!(hits[0].content, "Wash your hands often");
    assert_eq!(kb.stats().await.categories["health_tips"], 1);

    assert!(kb.clear().await.is_err());
    assert_eq!(kb.len().await, 1);
}

#[tokio::test]
async fn identical_document_ranks_first() {
    let dir = tempfile::tempdir().unwrap();
    let kb = KnowledgeBase::with_documents(
        dir.path().join("kb.json"),
        vec![
            Document::new("a", "fever headache fatigue", "diseases"),
            Document::new("b", "cough and sore throat", "diseases"),
        ],
    );
    kb.add_document("q", "persistent dry cough at night", "general").await.unwrap();

    let hits = kb.query("persistent dry cough at night", 3).await;
    assert_eq!(hits[0].id, "q");
    assert_eq!(hits[0].distance, 0.0);
}

#[tokio::test]
async fn augmented_context_formats_hits() {
    let dir = tempfile::tempdir().unwrap();
    let kb = KnowledgeBase::with_documents(
        dir.path().join("kb.json"),
        vec![
            Document::new("a", "Hydration helps kidney health", "health_tips"),
            Document::new("b", "Kidney stones cause sharp pain", "diseases"),
        ],
    );

    let context = kb.augmented_context("kidney", 2).await;
    assert_eq!(
        context,
        "[HEALTH_TIPS]\nHydration helps kidney health\n\n---\n\n[DISEASES]\nKidney stones cause sharp pain"
    );

    kb.clear().await.unwrap();
    assert_eq!(kb.augmented_context("kidney", 2).await, "");
    assert!(kb.is_empty().await);
}

#[tokio::test]
async fn embed_and_stats_endpoints() {
    let dir = tempfile::tempdir().unwrap();
    let kb = Arc::new(KnowledgeBase::with_documents(dir.path().join("kb.json"), Vec::new()));
    let app = knowledge_routes(kb.clone());

    let request = Request::builder()
        .method("POST")
        .uri("/embed")
        .header("content-type", "application/json")
        .body(Body::from(json!({"id": "doc1", "content": "Vitamin D supports bones"}).to_string()))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["message"], "Document doc1 added successfully");

    let request = Request::builder().uri("/stats").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["total_documents"], 1);
    assert_eq!(json["categories"]["general"], 1);
}
