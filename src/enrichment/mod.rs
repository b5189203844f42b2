//! Asynchronous client address enrichment
//!
//! Reads never wait on the network: cache misses are queued on a
//! deduplicating work queue and resolved by a single background worker,
//! which caches every outcome (including "unknown") for a bounded time.
//! Enrichment is eventually consistent.

pub mod cache;
pub mod client;
pub mod geoip;
pub mod models;
pub mod queue;
pub mod reader;
pub mod retry;
pub mod worker;

pub use cache::EnrichmentCache;
pub use client::{AddressLookup, IpInfoClient, LookupError};
pub use geoip::MaxMindLookup;
pub use models::AddressInfo;
pub use queue::PendingWorkQueue;
pub use reader::EnrichmentReader;
pub use retry::{RetryPolicy, RetryingLookupClient};
pub use worker::{EnrichmentWorker, WorkerHandle};
