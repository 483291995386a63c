//! Kernel layer: the numerical core of PatchCore scoring.
//!
//! Everything here is a pure, deterministic computation with no shared
//! state:
//! - Validated backbone outputs ([`FeatureMap`])
//! - Half-pixel bilinear resampling ([`resample`])
//! - Fused, L2-normalised patch embeddings ([`PatchEmbedder`])
//! - Exact brute-force nearest-neighbour distances ([`Distance`])
//! - Embedding/gallery dimension reconciliation ([`DimensionReconciler`])
//! - Image score aggregation and thresholding ([`AnomalyScorer`])
//!
//! This layer has no dependencies on [`memory`](crate::memory) or
//! [`highlevel`](crate::highlevel).
//!
//! # Example
//!
//! ```rust
//! use patchcore::kernel::{AnomalyScorer, FeatureMap, Metric, PatchEmbedder, ScoreRequest};
//!
//! let fine = FeatureMap::from_chw("layer3", 2, 1, 2, vec![1.0, 0.0, 0.0, 1.0]).unwrap();
//! let table = PatchEmbedder::build_single(&fine).unwrap();
//!
//! let gallery = [1.0, 0.0];
//! let result = AnomalyScorer::score(ScoreRequest {
//!     rows: table.rows(),
//!     patches: table.patches(),
//!     dim: table.dim(),
//!     gallery: &gallery,
//!     ntotal: 1,
//!     metric: Metric::InnerProductComplement,
//!     threshold: 0.5,
//! })
//! .unwrap();
//! assert!(result.is_anomaly);
//! ```

pub mod distance;
pub mod embedding;
pub mod feature_map;
pub mod reconcile;
pub mod resample;
pub mod scorer;

pub use distance::{Distance, Metric};
pub use embedding::{l2_normalize_rows, PatchEmbedder, PatchEmbeddingTable};
pub use feature_map::FeatureMap;
pub use reconcile::{DimensionReconciler, Reconciliation, FINE_ONLY_DIM, FUSED_DIM};
pub use resample::resize_bilinear;
pub use scorer::{
    infer_dim, infer_rows, AnomalyResult, AnomalyScorer, Inferred, LengthCorrection, ScoreRequest,
};
