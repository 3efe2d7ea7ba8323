//! Shared utilities for the Lexdesk report engine.
//!
//! - Pagination of list endpoints
//! - Custom validators used by request models

pub mod pagination;
pub mod validation;
