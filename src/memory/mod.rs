//! Memory layer: the bank of nominal patch embeddings.
//!
//! This module provides:
//!
//! - [`Gallery`]: the immutable, shareable reference set every scoring call
//!   searches, with its row width inferred from the buffer.
//!
//! Loading the buffer from disk is left to the caller.
//!
//! # Usage
//!
//! ```rust
//! use patchcore::memory::Gallery;
//! use patchcore::kernel::{Distance, Metric};
//!
//! let gallery = Gallery::new(vec![1.0, 0.0, 0.0, 1.0], 2).unwrap();
//! let query = [0.6, 0.8];
//! let mins = Distance::rowwise_min(&query, gallery.rows(), gallery.dim(), Metric::InnerProductComplement);
//! assert!((mins[0] - 0.2).abs() < 1e-6);
//! ```

pub mod gallery;

pub use gallery::Gallery;
