//! Domain model for todo records.
//!
//! # Responsibility
//! - Define the canonical `Todo` record shared by repository, service and FFI.
//! - Define input/patch shapes used by create and partial-update flows.
//!
//! # Invariants
//! - Every todo is identified by an opaque `TodoId` unique within the local
//!   collection.
//! - Deletion is a hard delete; there are no tombstones.

pub mod todo;
