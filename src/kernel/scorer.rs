//! Image-level anomaly scoring.
//!
//! Scores one image's patch embeddings against a gallery of nominal patches:
//! every patch gets the distance to its nearest gallery row, the image score
//! is the worst (largest) of those, and the image is anomalous when that
//! score is strictly above the threshold.
//!
//! Length metadata handed in by callers is treated asymmetrically. A wrong
//! patch count is replaced by the count derived from the buffer (and
//! logged); a gallery whose derived dimension disagrees with the embedding
//! dimension is a hard error.

use crate::error::{PatchCoreError, Result};
use crate::kernel::distance::{Distance, Metric};
use serde::Serialize;
use tracing::{debug, warn};

/// Outcome of scoring one image.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AnomalyResult {
    /// `max(patch_min_distances)`.
    pub image_score: f32,
    /// Distance from each patch to its nearest gallery row, in patch order.
    pub patch_min_distances: Vec<f32>,
    /// `image_score > threshold`.
    pub is_anomaly: bool,
}

/// A declared length that disagreed with the buffer it described.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LengthCorrection {
    pub declared: usize,
    pub inferred: usize,
}

/// A length derived from data, with the correction applied to the caller's
/// claim if there was one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Inferred {
    pub value: usize,
    pub correction: Option<LengthCorrection>,
}

/// Derive the row count of a `len`-long buffer of `dim`-wide rows.
///
/// Fails when `len` is not a multiple of `dim` (or `dim` is zero). A
/// `declared` count that disagrees is replaced, not rejected.
pub fn infer_rows(what: &'static str, len: usize, dim: usize, declared: Option<usize>) -> Result<Inferred> {
    if dim == 0 || len % dim != 0 {
        return Err(PatchCoreError::InvalidLength {
            what,
            len,
            divisor: dim,
        });
    }
    let value = len / dim;
    let correction = declared
        .filter(|&d| d != value)
        .map(|declared| LengthCorrection {
            declared,
            inferred: value,
        });
    Ok(Inferred { value, correction })
}

/// Derive the row width of a `len`-long buffer holding `rows` rows.
pub fn infer_dim(what: &'static str, len: usize, rows: usize) -> Result<usize> {
    if rows == 0 || len % rows != 0 {
        return Err(PatchCoreError::InvalidLength {
            what,
            len,
            divisor: rows,
        });
    }
    Ok(len / rows)
}

/// Parameters for one scoring call.
#[derive(Clone, Copy, Debug)]
pub struct ScoreRequest<'a> {
    /// Patch embeddings, row-major.
    pub rows: &'a [f32],
    /// Patch count the caller believes `rows` holds.
    pub patches: usize,
    /// Embedding width of `rows`.
    pub dim: usize,
    /// Gallery embeddings, row-major.
    pub gallery: &'a [f32],
    /// Number of gallery rows.
    pub ntotal: usize,
    pub metric: Metric,
    pub threshold: f32,
}

pub struct AnomalyScorer;

impl AnomalyScorer {
    /// Score one image's patch embeddings against the gallery.
    pub fn score(request: ScoreRequest<'_>) -> Result<AnomalyResult> {
        let ScoreRequest {
            rows,
            patches,
            dim,
            gallery,
            ntotal,
            metric,
            threshold,
        } = request;

        if rows.is_empty() {
            return Err(PatchCoreError::EmptyInput("patch embedding rows".into()));
        }
        if gallery.is_empty() {
            return Err(PatchCoreError::EmptyInput("gallery".into()));
        }

        let inferred = infer_rows("patch embedding rows", rows.len(), dim, Some(patches))?;
        if let Some(c) = inferred.correction {
            warn!(
                declared = c.declared,
                inferred = c.inferred,
                "declared patch count disagrees with embedding buffer, using inferred"
            );
        }
        let patches = inferred.value;

        let gallery_dim = infer_dim("gallery", gallery.len(), ntotal)?;
        if gallery_dim != dim {
            return Err(PatchCoreError::DimensionMismatch {
                query: dim,
                gallery: gallery_dim,
            });
        }

        let patch_min_distances = Distance::rowwise_min(rows, gallery, dim, metric);
        let image_score = patch_min_distances
            .iter()
            .copied()
            .fold(f32::NEG_INFINITY, f32::max);
        let is_anomaly = image_score > threshold;

        debug!(
            patches,
            ntotal,
            dim,
            %metric,
            image_score,
            threshold,
            is_anomaly,
            "scored image"
        );

        Ok(AnomalyResult {
            image_score,
            patch_min_distances,
            is_anomaly,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request<'a>(rows: &'a [f32], dim: usize, gallery: &'a [f32], ntotal: usize) -> ScoreRequest<'a> {
        ScoreRequest {
            rows,
            patches: rows.len() / dim.max(1),
            dim,
            gallery,
            ntotal,
            metric: Metric::InnerProductComplement,
            threshold: 0.5,
        }
    }

    #[test]
    fn test_single_gallery_row_scenario() {
        let gallery = [1.0, 0.0, 0.0, 0.0];
        let rows = [1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0];
        let result = AnomalyScorer::score(request(&rows, 4, &gallery, 1)).unwrap();

        assert_eq!(result.patch_min_distances.len(), 2);
        assert!(result.patch_min_distances[0].abs() < 1e-6);
        assert!((result.patch_min_distances[1] - 1.0).abs() < 1e-6);
        assert!((result.image_score - 1.0).abs() < 1e-6);
        assert!(result.is_anomaly);
    }

    #[test]
    fn test_image_score_is_max() {
        let gallery = [0.0, 0.0];
        let rows = [1.0, 0.0, 0.0, 3.0, 0.0, 2.0];
        let mut req = request(&rows, 2, &gallery, 1);
        req.metric = Metric::Euclidean;
        let result = AnomalyScorer::score(req).unwrap();
        let max = result
            .patch_min_distances
            .iter()
            .copied()
            .fold(f32::NEG_INFINITY, f32::max);
        assert_eq!(result.image_score, max);
        assert!((result.image_score - 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_equal_distances_give_that_score() {
        let gallery = [0.0, 0.0];
        let rows = [1.0, 0.0, 0.0, 1.0, -1.0, 0.0];
        let mut req = request(&rows, 2, &gallery, 1);
        req.metric = Metric::Euclidean;
        let result = AnomalyScorer::score(req).unwrap();
        assert_eq!(result.image_score, 1.0);
        assert!(result.patch_min_distances.iter().all(|&d| d == 1.0));
    }

    #[test]
    fn test_threshold_is_strict() {
        let gallery = [0.0];
        let rows = [0.5];
        let mut req = request(&rows, 1, &gallery, 1);
        req.metric = Metric::Euclidean;
        req.threshold = 0.5;
        assert!(!AnomalyScorer::score(req).unwrap().is_anomaly);
        req.threshold = 0.49;
        assert!(AnomalyScorer::score(req).unwrap().is_anomaly);
    }

    #[test]
    fn test_empty_rows_fail() {
        let err = AnomalyScorer::score(request(&[], 4, &[1.0, 0.0, 0.0, 0.0], 1)).unwrap_err();
        assert!(matches!(err, PatchCoreError::EmptyInput(_)));
    }

    #[test]
    fn test_empty_gallery_fails() {
        let err = AnomalyScorer::score(request(&[1.0, 0.0], 2, &[], 0)).unwrap_err();
        assert!(matches!(err, PatchCoreError::EmptyInput(_)));
    }

    #[test]
    fn test_rows_not_divisible_fail() {
        let rows = [1.0, 0.0, 0.0];
        let err = AnomalyScorer::score(request(&rows, 2, &[1.0, 0.0], 1)).unwrap_err();
        assert!(matches!(
            err,
            PatchCoreError::InvalidLength { len: 3, divisor: 2, .. }
        ));
    }

    #[test]
    fn test_gallery_not_divisible_fails() {
        let rows = [1.0, 0.0];
        let err = AnomalyScorer::score(request(&rows, 2, &[1.0, 0.0, 0.0], 2)).unwrap_err();
        assert!(matches!(
            err,
            PatchCoreError::InvalidLength { what: "gallery", .. }
        ));
    }

    #[test]
    fn test_gallery_dim_mismatch_is_fatal() {
        let rows = [1.0, 0.0];
        let gallery = [1.0, 0.0, 0.0];
        let err = AnomalyScorer::score(request(&rows, 2, &gallery, 1)).unwrap_err();
        assert!(matches!(
            err,
            PatchCoreError::DimensionMismatch { query: 2, gallery: 3 }
        ));
    }

    #[test]
    fn test_wrong_declared_patches_is_replaced() {
        let gallery = [1.0, 0.0];
        let rows = [1.0, 0.0, 0.0, 1.0, 1.0, 0.0];
        let mut req = request(&rows, 2, &gallery, 1);
        req.patches = 7;
        let result = AnomalyScorer::score(req).unwrap();
        assert_eq!(result.patch_min_distances.len(), 3);
    }

    #[test]
    fn test_infer_rows_reports_correction() {
        let inferred = infer_rows("rows", 12, 4, Some(5)).unwrap();
        assert_eq!(inferred.value, 3);
        assert_eq!(
            inferred.correction,
            Some(LengthCorrection {
                declared: 5,
                inferred: 3
            })
        );
        assert_eq!(infer_rows("rows", 12, 4, Some(3)).unwrap().correction, None);
        assert_eq!(infer_rows("rows", 12, 4, None).unwrap().correction, None);
    }

    #[test]
    fn test_infer_rejects_zero_divisor() {
        assert!(infer_rows("rows", 12, 0, None).is_err());
        assert!(infer_dim("gallery", 12, 0).is_err());
    }
}
