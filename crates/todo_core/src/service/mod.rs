//! Presentation-facing services.
//!
//! # Responsibility
//! - Validate user input at the presentation boundary.
//! - Route queries through an explicit read-through cache.
//! - Invalidate cached queries after each successful write.

pub mod query_cache;
pub mod todo_service;
