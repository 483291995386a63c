//! Reconciling embedding and gallery dimensionality.
//!
//! Exactly one mismatch is corrected automatically: fused coarse+fine
//! embeddings (1536 channels) scored against a gallery built from the fine
//! stage alone (1024 channels). The leading coarse-stage channels are
//! dropped and the remaining tail is re-normalised. Every other mismatch is
//! a [`PatchCoreError::DimensionMismatch`].

use crate::error::{PatchCoreError, Result};
use crate::kernel::embedding::{l2_normalize_rows, PatchEmbeddingTable};
use tracing::info;

/// Channel count of fused coarse+fine embeddings.
pub const FUSED_DIM: usize = 1536;

/// Channel count of fine-stage-only galleries.
pub const FINE_ONLY_DIM: usize = 1024;

/// What the reconciler will do for a `(dim, gallery_dim)` pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reconciliation {
    /// Dimensions already agree.
    Unchanged,
    /// Drop the first `drop` channels of every row.
    DropLeading { drop: usize },
}

pub struct DimensionReconciler;

impl DimensionReconciler {
    /// Decide how to reconcile an embedding of `dim` channels with a gallery
    /// of `gallery_dim` channels.
    pub fn plan(dim: usize, gallery_dim: usize) -> Result<Reconciliation> {
        match (dim, gallery_dim) {
            (d, g) if d == g => Ok(Reconciliation::Unchanged),
            (FUSED_DIM, FINE_ONLY_DIM) => Ok(Reconciliation::DropLeading {
                drop: FUSED_DIM - FINE_ONLY_DIM,
            }),
            (query, gallery) => Err(PatchCoreError::DimensionMismatch { query, gallery }),
        }
    }

    /// Slice row-major `rows` of width `dim` down to `gallery_dim` columns if
    /// the pair is reconcilable. Returns the new buffer and its row width.
    ///
    /// Sliced rows are L2-normalised again.
    pub fn reconcile_rows(rows: &[f32], dim: usize, gallery_dim: usize) -> Result<(Vec<f32>, usize)> {
        match Self::plan(dim, gallery_dim)? {
            Reconciliation::Unchanged => Ok((rows.to_vec(), dim)),
            Reconciliation::DropLeading { drop } => {
                let kept = dim - drop;
                let mut out = Vec::with_capacity(rows.len() / dim * kept);
                for row in rows.chunks_exact(dim) {
                    out.extend_from_slice(&row[drop..]);
                }
                l2_normalize_rows(&mut out, kept);
                info!(
                    from = dim,
                    to = kept,
                    dropped = drop,
                    "dropped leading coarse-stage channels to match gallery"
                );
                Ok((out, kept))
            }
        }
    }

    /// Reconcile a whole table against a gallery dimension.
    ///
    /// Returns the table unchanged when the dimensions agree.
    pub fn reconcile(table: PatchEmbeddingTable, gallery_dim: usize) -> Result<PatchEmbeddingTable> {
        if let Reconciliation::Unchanged = Self::plan(table.dim(), gallery_dim)? {
            return Ok(table);
        }
        let (rows, dim) = Self::reconcile_rows(table.rows(), table.dim(), gallery_dim)?;
        PatchEmbeddingTable::from_rows(table.grid_h(), table.grid_w(), dim, rows)
    }
}
