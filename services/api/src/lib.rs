//! evently API library.
//!
//! This crate primarily ships an `evently-api` binary, but we expose a small
//! library surface to enable integration testing and reuse.

pub mod api;
pub mod config;
pub mod db;
pub mod events;
pub mod state;
pub mod store;
