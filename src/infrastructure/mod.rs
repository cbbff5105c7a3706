//! Infrastructure layer - External concerns
//!
//! This layer contains:
//! - Config: Configuration loading
//! - Adapters: Gateway implementations (Discord, console, scripted)
//! - Keep-alive: HTTP liveness and status endpoint

pub mod adapters;
pub mod config;
pub mod keepalive;
