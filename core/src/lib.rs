//! Flowpull core library providing the building blocks of the transfer engine.
//!
//! This crate contains the flow data model, the capability traits the
//! orchestrator is driven through (flow directory, credential resolver,
//! remote transport, object store writer), and shared utilities such as
//! retry configuration.

/// Flow directory capability for looking up flow definitions by id.
pub mod directory;
/// Flow definitions: source and target configuration and validation.
pub mod flow;
/// Retry configuration with exponential backoff and jitter.
pub mod retry;
/// Base runner trait for long-lived executable components.
pub mod runner;
/// Credential model and resolution from opaque references.
pub mod secrets;
/// Object store writer capability.
pub mod store;
/// Remote transport capability: sessions, listings and downloads.
pub mod transport;

/// Boxed error type used where capability implementations supply the cause.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;
