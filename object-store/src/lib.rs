//! Object storage writer for flowpull, built on the `object_store` crate.

/// Per-bucket object store construction.
pub mod client;
/// Writer implementing the object store capability.
pub mod writer;

pub use writer::{Writer, WriterBuilder};
