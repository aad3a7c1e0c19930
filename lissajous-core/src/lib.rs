//! Lissajous Core
//!
//! Core types shared by the Lissajous render service, its runner, and its clients.
//!
//! This crate contains:
//! - Domain types: colors, shape parameters, job identity and status
//! - DTOs: request and response bodies of the HTTP API

pub mod domain;
pub mod dto;
