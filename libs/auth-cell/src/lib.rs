pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::*;
pub use router::{auth_routes, doctor_directory_routes};
pub use services::auth::AuthService;
