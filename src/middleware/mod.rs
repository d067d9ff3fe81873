pub mod auth;

pub use auth::{AdminMiddleware, HealthMiddleware};
