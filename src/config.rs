//! Scoring configuration.
//!
//! The metric and threshold come out of the metadata exported alongside a
//! gallery. Reading that metadata from disk belongs to the caller; this
//! module only parses the JSON text it hands over.

use crate::error::Result;
use crate::kernel::distance::Metric;
use serde::{Deserialize, Serialize};

/// Session-wide scoring parameters.
///
/// ```rust
/// use patchcore::{Metric, ScoringConfig};
///
/// let cfg = ScoringConfig::from_json(r#"{"metric": "l2", "threshold": 0.42}"#).unwrap();
/// assert_eq!(cfg.metric, Metric::Euclidean);
///
/// // metric defaults to the inner-product complement
/// let cfg = ScoringConfig::from_json(r#"{"threshold": 0.3}"#).unwrap();
/// assert_eq!(cfg.metric, Metric::InnerProductComplement);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    #[serde(default)]
    pub metric: Metric,
    /// Image scores strictly above this are anomalous.
    pub threshold: f32,
}

impl ScoringConfig {
    pub fn new(metric: Metric, threshold: f32) -> Self {
        Self { metric, threshold }
    }

    /// Parse from JSON text.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
