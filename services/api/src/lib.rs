//! services/api/src/lib.rs
//!
//! Library root for the `api` service. The binaries in `src/bin` pull
//! everything they need from here.

pub mod adapters;
pub mod config;
pub mod error;
pub mod web;
