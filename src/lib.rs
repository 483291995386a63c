//! # PatchCore: nearest-neighbour patch anomaly scoring
//!
//! Scores a single image for visual anomalies by comparing local patch
//! embeddings against a memory bank ("gallery") of patches collected from
//! known-good images. An image is as anomalous as its worst-matching patch.
//!
//! ## Quick Start
//!
//! ```rust
//! use patchcore::{FeatureMap, Gallery, PatchCore, ScoringConfig};
//!
//! // Gallery and metadata come from an external loader.
//! let gallery = Gallery::new(vec![1.0, 0.0, 0.0, 1.0], 2).unwrap();
//! let config = ScoringConfig::from_json(r#"{"metric": "ip", "threshold": 0.5}"#).unwrap();
//! let session = PatchCore::new(gallery, config);
//!
//! // Feature maps come from an external backbone, shaped [1, C, H, W].
//! let coarse = FeatureMap::new("layer2", &[1, 1, 2, 2], vec![1.0; 4]).unwrap();
//! let fine = FeatureMap::new("layer3", &[1, 1, 4, 4], vec![0.0; 16]).unwrap();
//!
//! let inspection = session.score(&coarse, &fine).unwrap();
//! println!("score={:.4} -> {}", inspection.image_score(), inspection.label());
//! ```
//!
//! ## Pipeline
//!
//! 1. **Embed**: resample the coarse map onto the fine grid, stack channels
//!    (coarse first), one L2-normalised row per location.
//! 2. **Reconcile**: match the embedding width to the gallery width
//!    (only 1536 → 1024 is corrected; anything else fails).
//! 3. **Search**: exact brute-force minimum distance per patch.
//! 4. **Aggregate**: image score = max patch distance; anomalous when
//!    strictly above the threshold.
//!
//! ## Features
//!
//! - `parallel` (default): per-patch search runs on rayon workers.
//! - `simd`: inner products via `simsimd`.

pub mod config;
pub mod error;
pub mod highlevel;
pub mod kernel;
pub mod memory;

// Re-exports for convenience
pub use config::ScoringConfig;
pub use error::{PatchCoreError, Result};
pub use highlevel::{Inspection, PatchCore};
pub use kernel::{
    AnomalyResult, AnomalyScorer, DimensionReconciler, Distance, FeatureMap, Metric,
    PatchEmbedder, PatchEmbeddingTable, ScoreRequest,
};
pub use memory::Gallery;
