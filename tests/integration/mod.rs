//! Integration test suite for chromup
//!
//! Runs the update pipeline and the binary against a loopback HTTP server
//! standing in for the snapshot bucket.
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **end_to_end**: Full orchestrator runs (install, reinstall, failures)
//! - **cli**: The `chromup` binary and its commands

// Shared test utilities (from parent tests/ directory)
#[path = "../common/mod.rs"]
mod common;

mod cli;
mod end_to_end;
