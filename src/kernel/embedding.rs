//! Patch embeddings: fuse backbone feature maps into one row per location.
//!
//! The builder takes a "coarse" map (earlier backbone stage, lower
//! resolution) and a "fine" map (the stage whose grid defines the patches),
//! brings the coarse map onto the fine grid, stacks channels and rewrites
//! the result patch-major with every row L2-normalised.
//!
//! # Example
//!
//! ```rust
//! use patchcore::kernel::{FeatureMap, PatchEmbedder};
//!
//! let coarse = FeatureMap::from_chw("layer2", 2, 4, 4, vec![1.0; 32]).unwrap();
//! let fine = FeatureMap::from_chw("layer3", 3, 2, 2, vec![1.0; 12]).unwrap();
//!
//! let table = PatchEmbedder::build(&coarse, &fine).unwrap();
//! assert_eq!(table.patches(), 4); // fine grid is 2x2
//! assert_eq!(table.dim(), 5);     // 2 coarse + 3 fine channels
//! ```

use crate::error::{PatchCoreError, Result};
use crate::kernel::feature_map::FeatureMap;
use tracing::debug;

/// Row-major table of L2-normalised patch embeddings.
///
/// Row `y * grid_w + x` holds the fused channel vector at spatial location
/// `(x, y)`. Tables are never mutated after construction.
#[derive(Clone, Debug, PartialEq)]
pub struct PatchEmbeddingTable {
    grid_h: usize,
    grid_w: usize,
    dim: usize,
    rows: Vec<f32>,
}

impl PatchEmbeddingTable {
    /// Wrap already-normalised rows laid out on a `grid_h x grid_w` grid.
    pub fn from_rows(grid_h: usize, grid_w: usize, dim: usize, rows: Vec<f32>) -> Result<Self> {
        if rows.len() != grid_h * grid_w * dim {
            return Err(PatchCoreError::InvalidLength {
                what: "embedding rows",
                len: rows.len(),
                divisor: dim,
            });
        }
        Ok(Self {
            grid_h,
            grid_w,
            dim,
            rows,
        })
    }

    pub fn grid_h(&self) -> usize {
        self.grid_h
    }

    pub fn grid_w(&self) -> usize {
        self.grid_w
    }

    /// Embedding dimensionality (fused channel count).
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of patches, `grid_h * grid_w`.
    pub fn patches(&self) -> usize {
        self.grid_h * self.grid_w
    }

    /// Flat row-major buffer of `patches() * dim()` values.
    pub fn rows(&self) -> &[f32] {
        &self.rows
    }

    /// Embedding of patch `i`.
    pub fn row(&self, i: usize) -> &[f32] {
        &self.rows[i * self.dim..(i + 1) * self.dim]
    }

    pub fn into_rows(self) -> Vec<f32> {
        self.rows
    }
}

/// Builds [`PatchEmbeddingTable`]s from backbone feature maps.
pub struct PatchEmbedder;

impl PatchEmbedder {
    /// Fuse a coarse and a fine feature map into a patch embedding table.
    ///
    /// The coarse map is bilinearly resampled onto the fine map's grid when
    /// their sizes differ; the fine map is never resampled. Coarse channels
    /// precede fine channels in every row, matching how galleries are built.
    pub fn build(coarse: &FeatureMap, fine: &FeatureMap) -> Result<PatchEmbeddingTable> {
        let (grid_h, grid_w) = (fine.height(), fine.width());
        let resampled = coarse.height() != grid_h || coarse.width() != grid_w;
        let coarse_aligned = coarse.resized(grid_h, grid_w);

        let dim = coarse.channels() + fine.channels();
        let mut rows = vec![0.0f32; grid_h * grid_w * dim];
        scatter_channels(&mut rows, dim, 0, &coarse_aligned);
        scatter_channels(&mut rows, dim, coarse.channels(), fine);
        l2_normalize_rows(&mut rows, dim);

        debug!(
            grid_h,
            grid_w,
            dim,
            coarse_channels = coarse.channels(),
            fine_channels = fine.channels(),
            resampled,
            "built fused patch embeddings"
        );

        PatchEmbeddingTable::from_rows(grid_h, grid_w, dim, rows)
    }

    /// Build embeddings from a single feature map (fine stage only).
    pub fn build_single(fine: &FeatureMap) -> Result<PatchEmbeddingTable> {
        let (grid_h, grid_w) = (fine.height(), fine.width());
        let dim = fine.channels();
        let mut rows = vec![0.0f32; grid_h * grid_w * dim];
        scatter_channels(&mut rows, dim, 0, fine);
        l2_normalize_rows(&mut rows, dim);

        debug!(grid_h, grid_w, dim, "built single-stage patch embeddings");

        PatchEmbeddingTable::from_rows(grid_h, grid_w, dim, rows)
    }
}

/// Copy each channel plane of `fm` into column `offset + c` of the
/// patch-major `rows` buffer.
fn scatter_channels(rows: &mut [f32], dim: usize, offset: usize, fm: &FeatureMap) {
    if dim == 0 {
        return;
    }
    for c in 0..fm.channels() {
        for (row, &v) in rows.chunks_exact_mut(dim).zip(fm.channel(c)) {
            row[offset + c] = v;
        }
    }
}

/// Scale every `dim`-length row of `rows` to unit L2 norm.
///
/// The sum of squares is accumulated in `f64` and each value is divided in
/// `f64` before narrowing, so rows whose norm exceeds `f32::MAX` still come
/// out unit length. Rows with an exactly zero norm are left untouched.
pub fn l2_normalize_rows(rows: &mut [f32], dim: usize) {
    if dim == 0 {
        return;
    }
    for row in rows.chunks_exact_mut(dim) {
        let sum: f64 = row.iter().map(|&v| (v as f64) * (v as f64)).sum();
        let norm = sum.sqrt();
        if norm > 0.0 {
            for v in row.iter_mut() {
                *v = (*v as f64 / norm) as f32;
            }
        }
    }
}
