//! HTTP request handlers, one module per resource.

pub mod events;
pub mod health;
pub mod llm;
pub mod purchase;

pub use health::{health_check, readiness_check};
