//! services/api/src/lib.rs
//!
//! The API service library: provider adapters, configuration and the web layer.
//! The `api` and `openapi` binaries are thin wrappers around it.

pub mod adapters;
pub mod config;
pub mod error;
pub mod web;
