//! Batch ingestion of platform documents into the vector index.

pub mod controller;
pub mod ledger;
pub mod throttle;

pub use controller::{IngestionController, IngestionOptions, IngestionSummary, RunPermit};
pub use ledger::IngestLedger;
pub use throttle::{Clock, ManualClock, RateLimiter, TokioClock};
