//! Service layer
//!
//! Business logic of the runner: turning shape parameters into an encoded
//! animation while keeping the job record up to date.

mod execution;

pub use execution::JobRunner;
