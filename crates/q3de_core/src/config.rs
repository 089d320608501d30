//! Construction-time configuration of the matching decoders.
//!
//! A configuration is read once per run and never mutated afterwards. It is
//! validated as a whole, so a decoder is never built from a configuration
//! that would fail later.

use crate::ConfigError;
use crate::cost::{AnomalyRegion, BoundaryAxis, CostModel, CostWeights};
use q3de_common::hw;

/// How path costs are computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CostMode {
    /// Direct and boundary routes only; any anomaly region is ignored.
    #[default]
    Direct,
    /// Paths may additionally route through the anomaly region.
    AnomalyAware,
}

/// Decoder configuration.
///
/// Defaults mirror the synthesized hardware: distance 7, seventy buffer
/// entries, direct costs with unit weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecoderConfig {
    /// Code distance of the patch being decoded.
    pub code_distance: u32,

    /// Event buffer capacity of the streaming matcher.
    pub capacity: usize,

    /// Cost computation mode.
    pub mode: CostMode,

    /// Anomaly region as `(lx, rx, ly, ry, lz, rz)` bounds.
    ///
    /// Only consulted in [`CostMode::AnomalyAware`].
    pub anomaly: Option<[i32; 6]>,

    /// Path weights inside and outside the anomaly.
    pub weights: CostWeights,

    /// Axis along which the matched boundary lies.
    pub axis: BoundaryAxis,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            code_distance: hw::DEFAULT_CODE_DISTANCE,
            capacity: hw::DEFAULT_BUFFER_ENTRIES,
            mode: CostMode::Direct,
            anomaly: None,
            weights: CostWeights::HARDWARE,
            axis: BoundaryAxis::X,
        }
    }
}

impl DecoderConfig {
    pub fn new(code_distance: u32, capacity: usize) -> Self {
        Self {
            code_distance,
            capacity,
            ..Self::default()
        }
    }

    /// Enables anomaly-aware costs through the given box.
    pub fn with_anomaly(mut self, bounds: [i32; 6], weights: CostWeights) -> Self {
        self.mode = CostMode::AnomalyAware;
        self.anomaly = Some(bounds);
        self.weights = weights;
        self
    }

    pub fn with_axis(mut self, axis: BoundaryAxis) -> Self {
        self.axis = axis;
        self
    }

    /// Validates the configuration and builds its cost model.
    ///
    /// An anomaly-aware configuration without a region degrades to direct
    /// costs: every anomaly-routed path is infinite.
    pub fn cost_model(&self) -> Result<CostModel, ConfigError> {
        if self.code_distance == 0 {
            return Err(ConfigError::ZeroCodeDistance);
        }
        if self.capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        let weights = CostWeights::new(self.weights.normal, self.weights.anomaly)?;

        match (self.mode, self.anomaly) {
            (CostMode::AnomalyAware, Some(bounds)) => {
                let region = AnomalyRegion::from_bounds(bounds, self.code_distance)?;
                Ok(CostModel::anomaly_aware(region, weights, self.axis))
            }
            _ => Ok(CostModel::with_weights(weights)),
        }
    }

    /// The anomaly region this configuration decodes against, if any.
    pub fn region(&self) -> Result<Option<AnomalyRegion>, ConfigError> {
        Ok(self.cost_model()?.region().copied())
    }
}
