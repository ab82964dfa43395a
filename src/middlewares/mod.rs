pub mod auth;
pub mod cors;

pub use auth::{AuthMiddleware, current_user, optional_user};
pub use cors::create_cors;
