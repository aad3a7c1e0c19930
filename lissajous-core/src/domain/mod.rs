//! Core domain types
//!
//! This module contains the structures shared between the server (which tracks
//! jobs) and the runner (which renders and encodes them).

pub mod color;
pub mod job;
pub mod shape;
