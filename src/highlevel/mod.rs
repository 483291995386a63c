//! High-level convenience API.
//!
//! This layer provides [`PatchCore`], an immutable scoring session that owns
//! a [`Gallery`](crate::memory::Gallery) and a
//! [`ScoringConfig`](crate::config::ScoringConfig) and delegates to the
//! [`kernel`](crate::kernel) layer.
//!
//! For production or library code that needs intermediate results (the
//! embedding table, the reconciliation plan), import from
//! [`kernel`](crate::kernel) and [`memory`](crate::memory) directly.

pub mod client;

pub use client::{Inspection, PatchCore};
