//! RingSight: a money-muling detection engine.
//!
//! Ingests a batch of timestamped transfer records, builds a directed
//! aggregate graph, runs three structural detectors in parallel under
//! per-detector deadlines (cycles, smurfing hubs, layered shell chains),
//! reconciles their rings, scores accounts 0–100, and emits a bounded
//! graph payload for visualisation.

pub mod api;
pub mod config;
pub mod core;
pub mod detectors;
pub mod error;
pub mod export;
pub mod ingest;
pub mod scoring;

pub use crate::config::Config;
pub use crate::core::pipeline::run_analysis;
pub use crate::core::{
    AccountFinding, AnalysisReport, PatternTag, Ring, Summary, TransferRecord,
};
pub use crate::error::AnalyzeError;
