use std::sync::Arc;

use axum::{
    extract::State,
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde_json::{json, Value};

use appointment_cell::{appointment_routes, AppointmentService};
use auth_cell::{auth_routes, doctor_directory_routes, AuthService};
use chat_cell::{chat_routes, ChatService};
use feedback_cell::{feedback_routes, FeedbackService};
use knowledge_cell::{knowledge_routes, KnowledgeBase};
use messaging_cell::{messaging_routes, MessagingService};
use shared_config::AppConfig;

pub const API_VERSION: &str = "2.0.0";

/// Every service the HTTP surface is assembled from.
#[derive(Clone)]
pub struct AppServices {
    pub config: Arc<AppConfig>,
    pub knowledge: Arc<KnowledgeBase>,
    pub chat: Arc<ChatService>,
    pub auth: Arc<AuthService>,
    pub appointments: Arc<AppointmentService>,
    pub feedback: Arc<FeedbackService>,
    pub messaging: Arc<MessagingService>,
}

pub fn create_router(services: AppServices) -> Router {
    let status_routes = Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .with_state(services.clone());

    Router::new()
        .merge(status_routes)
        .nest("/auth", auth_routes(services.auth.clone()))
        .merge(doctor_directory_routes(services.auth.clone()))
        .merge(chat_routes(services.chat.clone()))
        .merge(knowledge_routes(services.knowledge.clone()))
        .merge(appointment_routes(services.appointments.clone(), services.config.clone()))
        .merge(feedback_routes(services.feedback.clone(), services.config.clone()))
        .merge(messaging_routes(services.messaging.clone(), services.config.clone()))
}

async fn root(State(services): State<AppServices>) -> Json<Value> {
    Json(json!({
        "message": "HealthLink AI Backend is running",
        "status": "healthy",
        "ai_provider": services.chat.provider().unwrap_or("none"),
        "version": API_VERSION
    }))
}

async fn health_check(State(services): State<AppServices>) -> Json<Value> {
    let rag_stats = services.knowledge.stats().await;

    Json(json!({
        "status": "healthy",
        "ai_provider": services.chat.provider(),
        "ai_configured": services.chat.is_configured(),
        "rag_stats": rag_stats,
        "timestamp": Utc::now().to_rfc3339()
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::{body::Body, http::Request};
    use security_cell::SecurityServices;
    use shared_database::Database;
    use shared_utils::test_utils::TestConfig;
    use tower::ServiceExt;

    fn services() -> AppServices {
        let config = TestConfig::default().to_arc();
        let db = Database::open_in_memory().unwrap();
        let security = Arc::new(SecurityServices::new(&config, db.clone()).unwrap());
        let knowledge = Arc::new(KnowledgeBase::with_documents(
            std::env::temp_dir().join("healthlink-router-test.json"),
            vec![knowledge_cell::Document::new("faqs_0", "Drink water", "faqs")],
        ));

        AppServices {
            chat: Arc::new(ChatService::new(db.clone(), knowledge.clone(), None)),
            auth: Arc::new(AuthService::new(config.clone(), db.clone(), security.clone())),
            appointments: Arc::new(AppointmentService::new(db.clone(), security.clone())),
            feedback: Arc::new(FeedbackService::new(db.clone())),
            messaging: Arc::new(MessagingService::new(db, security)),
            knowledge,
            config,
        }
    }

    async fn get_json(router: Router, uri: &str) -> Value {
        let response = router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert!(response.status().is_success());
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn root_reports_missing_provider() {
        let body = get_json(create_router(services()), "/").await;
        assert_eq!(body["message"], "HealthLink AI Backend is running");
        assert_eq!(body["ai_provider"], "none");
        assert_eq!(body["version"], "2.0.0");
    }

    #[tokio::test]
    async fn health_includes_knowledge_stats() {
        let body = get_json(create_router(services()), "/health").await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["ai_configured"], false);
        assert!(body["ai_provider"].is_null());
        assert_eq!(body["rag_stats"]["total_documents"], 1);
        assert_eq!(body["rag_stats"]["categories"]["faqs"], 1);
    }

    #[tokio::test]
    async fn cell_routes_are_mounted() {
        let router = create_router(services());
        let doctors = get_json(router.clone(), "/doctors").await;
        assert!(doctors["doctors"].as_array().unwrap().is_empty());

        let stats = get_json(router, "/stats").await;
        assert_eq!(stats["total_documents"], 1);
    }
}
