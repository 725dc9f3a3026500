use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::middleware;
use dotenv::dotenv;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{self, TraceLayer};
use tracing::{info, warn, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod router;

use appointment_cell::AppointmentService;
use auth_cell::AuthService;
use chat_cell::{select_client, ChatService};
use feedback_cell::FeedbackService;
use knowledge_cell::KnowledgeBase;
use messaging_cell::MessagingService;
use security_cell::{security_middleware, SecurityServices};
use shared_config::AppConfig;
use shared_database::Database;

use crate::router::AppServices;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Loading Env Vars
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting HealthLink AI backend v{}", router::API_VERSION);

    // Load configuration
    let config = Arc::new(AppConfig::from_env());

    let db = Database::open(&config.database_path)
        .with_context(|| format!("opening database at {}", config.database_path))?;
    let security = Arc::new(SecurityServices::new(&config, db.clone())?);

    let knowledge = Arc::new(
        KnowledgeBase::open(&config.knowledge_base_path, &config.data_dir)
            .context("loading knowledge base")?,
    );
    info!("Knowledge base ready with {} documents", knowledge.len().await);

    let llm = select_client(&config, reqwest::Client::new());
    match llm.as_ref() {
        Some(client) => info!("AI provider: {}", client.provider()),
        None => warn!("Chat is disabled until GROQ_API_KEY or GEMINI_API_KEY is set"),
    }

    let auth = Arc::new(AuthService::new(config.clone(), db.clone(), security.clone()));
    if let (Some(username), Some(password)) = (&config.admin_username, &config.admin_password) {
        auth.ensure_admin(username, password).await?;
    }

    let services = AppServices {
        config: config.clone(),
        chat: Arc::new(ChatService::new(db.clone(), knowledge.clone(), llm)),
        knowledge,
        auth,
        appointments: Arc::new(AppointmentService::new(db.clone(), security.clone())),
        feedback: Arc::new(FeedbackService::new(db.clone())),
        messaging: Arc::new(MessagingService::new(db, security.clone())),
    };

    // Set up CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build the application router
    let app = router::create_router(services)
        .layer(middleware::from_fn_with_state(security, security_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(trace::DefaultMakeSpan::new()
                    .level(Level::INFO))
                .on_response(trace::DefaultOnResponse::new()
                    .level(Level::INFO)),
        )
        .layer(cors);

    // Run the server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
