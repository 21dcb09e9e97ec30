//! services/api/src/lib.rs
//!
//! The NightFall REST service: adapters for the core ports, configuration,
//! and the axum web layer shared by the binaries.

pub mod adapters;
pub mod config;
pub mod error;
pub mod web;
