//! Application-level utilities for the Sealbox CLI.
//!
//! This module provides:
//! - Config loading and path resolution
//! - Admin credential resolution against the application database
//! - The shared command context

mod admin;
mod context;
mod resolver;

// Re-export public API
pub use context::AppContext;
pub use resolver::{sealed_path_for, TokenPaths};
