pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::{Document, DocumentMetadata, KnowledgeError, KnowledgeStats, ScoredDocument};
pub use router::knowledge_routes;
pub use services::similarity::{rank, render_context, similarity};
pub use services::store::KnowledgeBase;
