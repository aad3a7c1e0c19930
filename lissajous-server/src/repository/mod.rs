//! Repository Module
//!
//! Data access layer for the server. Jobs live in memory only.

pub mod job;

// Re-export for convenience
pub use job as job_repository;
