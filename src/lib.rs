pub mod analysis;
pub mod api;
pub mod app;
pub mod config;
pub mod enrichment;
pub mod error;
pub mod orchestrator;
pub mod parser;
pub mod storage;
