//! Transfer orchestrator for flowpull.
//!
//! Drives one flow's remote pull end to end: configuration validation,
//! credential resolution, remote session lifecycle, the sequential per-file
//! transfer loop, and the resulting summary. All collaborators are reached
//! through the capability traits in `flowpull-core`, so every piece can be
//! substituted with a test double.

/// Transfer options: deadline and retry settings.
pub mod config;
/// The transfer orchestrator and its error taxonomy.
pub mod orchestrator;
/// Remote path and object key derivation.
pub mod path;

pub use config::TransferOptions;
pub use orchestrator::{Error, TransferOrchestrator, TransferOrchestratorBuilder, TransferSummary};
