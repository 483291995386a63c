//! Scoring session that owns a [`Gallery`] and a [`ScoringConfig`] and runs
//! the full kernel pipeline for one image at a time.
//!
//! For full control, import from [`kernel`](crate::kernel) and
//! [`memory`](crate::memory) directly.

use crate::config::ScoringConfig;
use crate::error::Result;
use crate::kernel::{
    AnomalyResult, AnomalyScorer, DimensionReconciler, FeatureMap, Metric, PatchEmbedder,
    PatchEmbeddingTable, ScoreRequest,
};
use crate::memory::Gallery;

/// Result of inspecting one image, with the patch grid it was scored on.
#[derive(Clone, Debug, PartialEq)]
pub struct Inspection {
    pub result: AnomalyResult,
    pub grid_h: usize,
    pub grid_w: usize,
}

impl Inspection {
    /// Per-patch nearest-neighbour distances reshaped to `grid_h` rows of
    /// `grid_w` values, ready to drive a heatmap.
    pub fn patch_grid(&self) -> Vec<&[f32]> {
        if self.grid_w == 0 {
            return Vec::new();
        }
        self.result
            .patch_min_distances
            .chunks_exact(self.grid_w)
            .collect()
    }

    pub fn image_score(&self) -> f32 {
        self.result.image_score
    }

    pub fn is_anomaly(&self) -> bool {
        self.result.is_anomaly
    }

    /// `"NotGood"` for anomalous images, `"Good"` otherwise.
    pub fn label(&self) -> &'static str {
        if self.result.is_anomaly {
            "NotGood"
        } else {
            "Good"
        }
    }
}

/// An immutable scoring session.
///
/// Built once from a loaded gallery and its metadata, then shared by
/// reference (or cheaply cloned) across every scoring call. Nothing in the
/// session changes after construction, so concurrent calls need no locking.
///
/// # Example
///
/// ```rust
/// use patchcore::highlevel::PatchCore;
/// use patchcore::kernel::{FeatureMap, Metric};
/// use patchcore::memory::Gallery;
/// use patchcore::ScoringConfig;
///
/// let gallery = Gallery::new(vec![1.0, 0.0], 1).unwrap();
/// let session = PatchCore::new(gallery, ScoringConfig::new(Metric::InnerProductComplement, 0.3));
///
/// // coarse: 1 channel on a 1x1 grid, fine: 1 channel on a 1x2 grid
/// let coarse = FeatureMap::from_chw("layer2", 1, 1, 1, vec![3.0]).unwrap();
/// let fine = FeatureMap::from_chw("layer3", 1, 1, 2, vec![0.0, 4.0]).unwrap();
///
/// let inspection = session.score(&coarse, &fine).unwrap();
/// assert_eq!(inspection.patch_grid().len(), 1);
/// assert!(inspection.is_anomaly());
/// ```
#[derive(Clone, Debug)]
pub struct PatchCore {
    gallery: Gallery,
    config: ScoringConfig,
}

impl PatchCore {
    pub fn new(gallery: Gallery, config: ScoringConfig) -> Self {
        Self { gallery, config }
    }

    pub fn gallery(&self) -> &Gallery {
        &self.gallery
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    pub fn metric(&self) -> Metric {
        self.config.metric
    }

    pub fn threshold(&self) -> f32 {
        self.config.threshold
    }

    /// Build fused embeddings from a coarse and a fine feature map and score
    /// them.
    pub fn score(&self, coarse: &FeatureMap, fine: &FeatureMap) -> Result<Inspection> {
        let table = PatchEmbedder::build(coarse, fine)?;
        self.score_embeddings(table)
    }

    /// Score using embeddings built from the fine feature map alone.
    pub fn score_single(&self, fine: &FeatureMap) -> Result<Inspection> {
        let table = PatchEmbedder::build_single(fine)?;
        self.score_embeddings(table)
    }

    /// Reconcile an embedding table with the gallery's width and score it.
    pub fn score_embeddings(&self, table: PatchEmbeddingTable) -> Result<Inspection> {
        let table = DimensionReconciler::reconcile(table, self.gallery.dim())?;
        let result = AnomalyScorer::score(ScoreRequest {
            rows: table.rows(),
            patches: table.patches(),
            dim: table.dim(),
            gallery: self.gallery.rows(),
            ntotal: self.gallery.len(),
            metric: self.config.metric,
            threshold: self.config.threshold,
        })?;
        Ok(Inspection {
            result,
            grid_h: table.grid_h(),
            grid_w: table.grid_w(),
        })
    }
}
