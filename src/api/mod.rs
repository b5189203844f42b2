//! HTTP surface over the orchestrator

pub mod handlers;
pub mod response;
pub mod routes;

pub use routes::create_api_router;
