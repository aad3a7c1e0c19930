//! Data Transfer Objects for client/server communication
//!
//! DTOs are the wire representations of domain entities: form submissions,
//! submission acknowledgements, and status snapshots.

pub mod job;
