//! Feature map type for PatchCore.
//!
//! A feature map is one named output of the external backbone network:
//! a 4-D `[1, C, H, W]` float tensor stored channel-major, so each channel's
//! `H * W` plane is contiguous.

use crate::error::{PatchCoreError, Result};
use crate::kernel::resample;

/// A validated `[1, C, H, W]` feature map.
///
/// Construction checks the rank, the leading batch dimension and the buffer
/// length, so every other kernel operation can rely on the layout.
#[derive(Clone, Debug, PartialEq)]
pub struct FeatureMap {
    channels: usize,
    height: usize,
    width: usize,
    /// Channel-major data, `channels * height * width` values.
    data: Vec<f32>,
}

impl FeatureMap {
    /// Create a feature map from an arbitrary shape and its flat buffer.
    ///
    /// `name` only shows up in the error message (e.g. `"layer2"`).
    pub fn new(name: &str, shape: &[usize], data: Vec<f32>) -> Result<Self> {
        if shape.len() != 4 || shape[0] != 1 {
            return Err(PatchCoreError::Shape(format!(
                "{} must be shape [1,C,H,W], got {:?}",
                name, shape
            )));
        }
        Self::from_chw(name, shape[1], shape[2], shape[3], data)
    }

    /// Create a feature map from its channel, height and width extents.
    pub fn from_chw(
        name: &str,
        channels: usize,
        height: usize,
        width: usize,
        data: Vec<f32>,
    ) -> Result<Self> {
        if height == 0 || width == 0 {
            return Err(PatchCoreError::Shape(format!(
                "{} has an empty spatial grid {}x{}",
                name, height, width
            )));
        }
        let expected = channels
            .checked_mul(height)
            .and_then(|n| n.checked_mul(width))
            .ok_or_else(|| {
                PatchCoreError::Shape(format!(
                    "{} shape [1,{},{},{}] overflows usize",
                    name, channels, height, width
                ))
            })?;
        if data.len() != expected {
            return Err(PatchCoreError::Shape(format!(
                "{} buffer holds {} values but [1,{},{},{}] needs {}",
                name,
                data.len(),
                channels,
                height,
                width,
                expected
            )));
        }
        Ok(Self {
            channels,
            height,
            width,
            data,
        })
    }

    /// Shape as `[1, C, H, W]`.
    pub fn shape(&self) -> [usize; 4] {
        [1, self.channels, self.height, self.width]
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of spatial locations, `H * W`.
    pub fn spatial(&self) -> usize {
        self.height * self.width
    }

    /// Get the raw channel-major data as a slice.
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// The contiguous `H * W` plane of channel `c`.
    ///
    /// # Panics
    /// Panics if `c >= self.channels()`.
    pub fn channel(&self, c: usize) -> &[f32] {
        let plane = self.spatial();
        &self.data[c * plane..(c + 1) * plane]
    }

    /// Value at `(c, y, x)`.
    pub fn at(&self, c: usize, y: usize, x: usize) -> f32 {
        self.data[(c * self.height + y) * self.width + x]
    }

    /// Bilinearly resample every channel to `height x width`.
    ///
    /// Returns a clone when the size already matches.
    pub fn resized(&self, height: usize, width: usize) -> Self {
        if height == self.height && width == self.width {
            return self.clone();
        }
        let data = resample::resize_bilinear(
            &self.data,
            self.channels,
            self.height,
            self.width,
            height,
            width,
        );
        Self {
            channels: self.channels,
            height,
            width,
            data,
        }
    }

    /// Consume the map and return its channel-major buffer.
    pub fn into_data(self) -> Vec<f32> {
        self.data
    }
}
