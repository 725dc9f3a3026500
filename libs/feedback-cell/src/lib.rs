pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::{Feedback, FeedbackError, FeedbackRequest};
pub use router::feedback_routes;
pub use services::FeedbackService;
