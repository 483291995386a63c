//! Distance metrics and exact nearest-neighbour search.
//!
//! When compiled with the `parallel` feature (default), each query row is
//! searched on a rayon worker and the result is bit-identical to the
//! sequential scan. With the `simd` feature, inner products use `simsimd`,
//! which accumulates in a different order, so distances match the scalar
//! path only within floating tolerance.

use crate::error::PatchCoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Available distance metrics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Metric {
    /// `1 - dot(a, b)`; both sides must already be unit-normalised
    #[default]
    InnerProductComplement,
    /// `sqrt(sum((a - b)^2))`
    Euclidean,
}

impl Metric {
    /// Short identifier used in exported metadata.
    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::InnerProductComplement => "ip",
            Metric::Euclidean => "l2",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = PatchCoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ip" | "cosine" | "inner_product" => Ok(Metric::InnerProductComplement),
            "l2" | "euclidean" => Ok(Metric::Euclidean),
            _ => Err(PatchCoreError::UnknownMetric(s.to_string())),
        }
    }
}

impl TryFrom<String> for Metric {
    type Error = PatchCoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Metric> for String {
    fn from(metric: Metric) -> Self {
        metric.as_str().to_string()
    }
}

/// Distance computation over `f32` rows.
pub struct Distance;

impl Distance {
    /// Compute the distance between two rows using the specified metric.
    pub fn compute(a: &[f32], b: &[f32], metric: Metric) -> f32 {
        match metric {
            Metric::InnerProductComplement => Self::inner_product_complement(a, b),
            Metric::Euclidean => Self::euclidean(a, b),
        }
    }

    /// `1 - dot(a, b)`.
    ///
    /// Nominally in `[0, 2]` for unit rows; meaningless otherwise. Unit norm
    /// is a precondition and is not re-checked here.
    pub fn inner_product_complement(a: &[f32], b: &[f32]) -> f32 {
        1.0 - Self::dot(a, b)
    }

    /// Raw dot product.
    #[cfg(feature = "simd")]
    pub fn dot(a: &[f32], b: &[f32]) -> f32 {
        use simsimd::SpatialSimilarity;
        match f32::dot(a, b) {
            Some(d) => d as f32,
            None => Self::dot_raw(a, b),
        }
    }

    #[cfg(not(feature = "simd"))]
    pub fn dot(a: &[f32], b: &[f32]) -> f32 {
        Self::dot_raw(a, b)
    }

    #[allow(dead_code)]
    fn dot_raw(a: &[f32], b: &[f32]) -> f32 {
        debug_assert_eq!(a.len(), b.len(), "Dimension mismatch in dot product");
        a.iter().zip(b.iter()).map(|(&x, &y)| x * y).sum()
    }

    /// Euclidean distance.
    pub fn euclidean(a: &[f32], b: &[f32]) -> f32 {
        debug_assert_eq!(a.len(), b.len(), "Dimension mismatch in euclidean");
        let sum_sq: f32 = a
            .iter()
            .zip(b.iter())
            .map(|(&x, &y)| {
                let diff = x - y;
                diff * diff
            })
            .sum();
        sum_sq.sqrt()
    }

    /// Smallest distance from `query` to any `dim`-length row of `references`.
    ///
    /// Exhaustive scan keeping a running minimum; returns `f32::INFINITY`
    /// when `references` is empty or `dim` is zero.
    pub fn min_distance(query: &[f32], references: &[f32], dim: usize, metric: Metric) -> f32 {
        if dim == 0 {
            return f32::INFINITY;
        }
        references
            .chunks_exact(dim)
            .fold(f32::INFINITY, |best, reference| {
                let d = Self::compute(query, reference, metric);
                if d < best {
                    d
                } else {
                    best
                }
            })
    }

    /// For every `dim`-length query row, the minimum distance to any
    /// reference row.
    ///
    /// Exact brute force, `O(Nq * Nr * dim)`. Both buffers must be row-major
    /// with lengths divisible by `dim`; callers validate that. A zero `dim`
    /// describes no rows and yields an empty result.
    #[cfg(feature = "parallel")]
    pub fn rowwise_min(queries: &[f32], references: &[f32], dim: usize, metric: Metric) -> Vec<f32> {
        if dim == 0 {
            return Vec::new();
        }
        queries
            .par_chunks_exact(dim)
            .map(|query| Self::min_distance(query, references, dim, metric))
            .collect()
    }

    #[cfg(not(feature = "parallel"))]
    pub fn rowwise_min(queries: &[f32], references: &[f32], dim: usize, metric: Metric) -> Vec<f32> {
        if dim == 0 {
            return Vec::new();
        }
        queries
            .chunks_exact(dim)
            .map(|query| Self::min_distance(query, references, dim, metric))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_parses_identifiers() {
        assert_eq!("ip".parse::<Metric>().unwrap(), Metric::InnerProductComplement);
        assert_eq!("IP".parse::<Metric>().unwrap(), Metric::InnerProductComplement);
        assert_eq!("cosine".parse::<Metric>().unwrap(), Metric::InnerProductComplement);
        assert_eq!("l2".parse::<Metric>().unwrap(), Metric::Euclidean);
        assert_eq!("Euclidean".parse::<Metric>().unwrap(), Metric::Euclidean);
    }

    #[test]
    fn test_metric_rejects_unknown() {
        let err = "manhattan".parse::<Metric>().unwrap_err();
        assert!(matches!(err, PatchCoreError::UnknownMetric(ref s) if s == "manhattan"));
    }

    #[test]
    fn test_metric_serde_uses_short_names() {
        assert_eq!(serde_json::to_string(&Metric::Euclidean).unwrap(), "\"l2\"");
        let m: Metric = serde_json::from_str("\"ip\"").unwrap();
        assert_eq!(m, Metric::InnerProductComplement);
        assert!(serde_json::from_str::<Metric>("\"hamming\"").is_err());
    }

    #[test]
    fn test_inner_product_complement_identical_unit_rows() {
        let a = [0.6, 0.8, 0.0];
        let d = Distance::inner_product_complement(&a, &a);
        assert!(d.abs() < 1e-6);
    }

    #[test]
    fn test_inner_product_complement_orthogonal() {
        let d = Distance::inner_product_complement(&[1.0, 0.0], &[0.0, 1.0]);
        assert!((d - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_euclidean_identical_is_exactly_zero() {
        let a = [0.3, -1.7, 2.25, 1e-4];
        assert_eq!(Distance::euclidean(&a, &a), 0.0);
    }

    #[test]
    fn test_euclidean_is_symmetric() {
        let rows: [[f32; 4]; 3] = [
            [0.1, -0.2, 0.3, 0.9],
            [1.5, 2.5, -3.5, 0.0],
            [-0.7, 0.0, 0.25, 1e3],
        ];
        for a in &rows {
            for b in &rows {
                assert_eq!(Distance::euclidean(a, b), Distance::euclidean(b, a));
            }
        }
    }

    #[test]
    fn test_euclidean_3_4_5() {
        let d = Distance::euclidean(&[0.0, 0.0], &[3.0, 4.0]);
        assert!((d - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_rowwise_min_picks_nearest() {
        let gallery = [1.0, 0.0, 0.0, 0.0];
        let queries = [1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0];
        let mins = Distance::rowwise_min(&queries, &gallery, 4, Metric::InnerProductComplement);
        assert_eq!(mins.len(), 2);
        assert!(mins[0].abs() < 1e-6);
        assert!((mins[1] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_rowwise_min_scans_every_reference() {
        // Nearest reference is the last one.
        let references = [10.0, 10.0, 5.0, 5.0, 1.0, 1.0, 0.0, 0.5];
        let mins = Distance::rowwise_min(&[0.0, 0.0], &references, 2, Metric::Euclidean);
        assert!((mins[0] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_rowwise_min_ties_report_value() {
        let references = [0.0, 1.0, 1.0, 0.0];
        let mins = Distance::rowwise_min(&[0.0, 0.0], &references, 2, Metric::Euclidean);
        assert!((mins[0] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_rowwise_min_matches_sequential_scan_exactly() {
        let references: Vec<f32> = (0..64).map(|i| ((i * 37) % 11) as f32 * 0.1 - 0.5).collect();
        let queries: Vec<f32> = (0..48).map(|i| ((i * 13) % 7) as f32 * 0.2 - 0.6).collect();
        for metric in [Metric::Euclidean, Metric::InnerProductComplement] {
            let mins = Distance::rowwise_min(&queries, &references, 4, metric);
            let sequential: Vec<f32> = queries
                .chunks_exact(4)
                .map(|q| Distance::min_distance(q, &references, 4, metric))
                .collect();
            assert_eq!(mins, sequential);
        }
    }

    #[test]
    fn test_zero_dim_yields_no_rows() {
        let mins = Distance::rowwise_min(&[1.0, 2.0], &[1.0], 0, Metric::Euclidean);
        assert!(mins.is_empty());
        assert_eq!(
            Distance::min_distance(&[], &[1.0], 0, Metric::Euclidean),
            f32::INFINITY
        );
    }

    #[test]
    fn test_min_distance_empty_references() {
        assert_eq!(
            Distance::min_distance(&[1.0], &[], 1, Metric::Euclidean),
            f32::INFINITY
        );
    }

    #[test]
    fn test_compute_dispatches() {
        let a = [0.6, 0.8];
        let b = [0.8, 0.6];
        assert_eq!(
            Distance::compute(&a, &b, Metric::Euclidean),
            Distance::euclidean(&a, &b)
        );
        assert_eq!(
            Distance::compute(&a, &b, Metric::InnerProductComplement),
            Distance::inner_product_complement(&a, &b)
        );
    }
}
