//! Extraction pipeline
//!
//! Ties the fetcher, parser and extractors together and routes each result
//! to the console, export files and the persistence layer.

mod coordinator;

pub use coordinator::{Coordinator, ExtractionRequest, RunOutcome};
