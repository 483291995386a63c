//! Gallery: the memory bank of nominal patch embeddings.
//!
//! A gallery is loaded once per session by an external loader and never
//! written to afterwards. Rows live behind an `Arc<[f32]>`, so clones are
//! cheap and every scoring thread reads the same buffer without locking.
//!
//! # Example
//!
//! ```rust
//! use patchcore::memory::Gallery;
//!
//! // Two rows of width 3; the width is inferred from the buffer.
//! let gallery = Gallery::new(vec![1.0, 0.0, 0.0, 0.0, 1.0, 0.0], 2).unwrap();
//! assert_eq!(gallery.dim(), 3);
//! assert_eq!(gallery.row(1), &[0.0, 1.0, 0.0]);
//! ```

use crate::error::{PatchCoreError, Result};
use crate::kernel::scorer::infer_dim;
use std::sync::Arc;

/// Immutable, shareable set of `len()` rows of width `dim()`.
#[derive(Clone, Debug)]
pub struct Gallery {
    /// Flat row-major: ntotal rows × dim columns.
    rows: Arc<[f32]>,
    ntotal: usize,
    dim: usize,
}

impl Gallery {
    /// Wrap a flat row-major buffer holding `ntotal` rows.
    ///
    /// The row width is derived from the buffer length, never assumed.
    pub fn new(rows: Vec<f32>, ntotal: usize) -> Result<Self> {
        if rows.is_empty() {
            return Err(PatchCoreError::EmptyInput("gallery".into()));
        }
        let dim = infer_dim("gallery", rows.len(), ntotal)?;
        Ok(Self {
            rows: rows.into(),
            ntotal,
            dim,
        })
    }

    /// Number of rows (`Ntotal`).
    pub fn len(&self) -> usize {
        self.ntotal
    }

    pub fn is_empty(&self) -> bool {
        self.ntotal == 0
    }

    /// Row width (`Dim_g`).
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Flat row-major buffer of `len() * dim()` values.
    pub fn rows(&self) -> &[f32] {
        &self.rows
    }

    /// Row `i`.
    ///
    /// # Panics
    /// Panics if `i >= self.len()`.
    pub fn row(&self, i: usize) -> &[f32] {
        &self.rows[i * self.dim..(i + 1) * self.dim]
    }

    /// Iterate over rows in order.
    pub fn iter_rows(&self) -> impl Iterator<Item = &[f32]> {
        self.rows.chunks_exact(self.dim)
    }
}
