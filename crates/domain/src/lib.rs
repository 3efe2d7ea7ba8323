//! Domain layer for the Lexdesk report engine.
//!
//! This crate contains:
//! - Report, template and comparison models
//! - The pure pipeline stages (filter, group, metrics, charts, export)
//! - The data collector abstraction
pub mod models;
pub mod services;
