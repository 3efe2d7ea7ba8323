//! Persistence layer for the Lexdesk report engine.
//!
//! This crate contains:
//! - Database connection management and report source read models
//! - The remote report API client
//! - The local fallback store and the resilient executor
//! - Report and template repositories

pub mod db;
pub mod entities;
pub mod error;
pub mod local_store;
pub mod metrics;
pub mod remote;
pub mod repositories;
pub mod resilient;
pub mod token;

pub use error::StoreError;
