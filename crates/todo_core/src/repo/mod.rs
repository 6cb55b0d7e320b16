//! Repository layer: reconciliation between local store and remote mirror.
//!
//! # Responsibility
//! - Seed the local collection from the remote on first run.
//! - Serve all reads from the local store afterwards.
//! - Mirror every write to the remote before committing it locally.
//!
//! # Invariants
//! - The repository is the only writer of the todo collection key.
//! - Write paths surface `NotFound` separately from transport/storage errors.

pub mod todo_repo;
