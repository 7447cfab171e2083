//! Kandan - personal anime library indexer with danmu matching and
//! acquisition.
//!
//! This library crate exposes the core functionality for integration
//! testing.

pub mod config;
pub mod danmu;
pub mod fingerprint;
pub mod orchestrator;
pub mod remote;
pub mod scanner;
pub mod server;
pub mod state;
pub mod workers;
