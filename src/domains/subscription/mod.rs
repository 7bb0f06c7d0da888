pub mod handlers;
pub mod service;

pub use handlers::routes;
pub use service::{SubscriptionService, SubscriptionToggle};
