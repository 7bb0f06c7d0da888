pub mod handlers;
pub mod service;

pub use handlers::routes;
pub use service::{LoginRequest, LoginSession, RegisterRequest, UserService};
