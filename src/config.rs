//! Run configuration: cycle parameters and file paths.
//!
//! `TsviConfig` is read from JSON. `CycleParameters` is the part the
//! numerical pipeline needs; the sample count N is always derived from it,
//! never configured directly.

use crate::algs::gradient::GradientWeighting;
use crate::mesh_error::MeshError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default point-array prefix for time-resolved WSS (`WSS_000`, `WSS_001`, ...).
pub const DEFAULT_ARRAY_PREFIX: &str = "WSS_";

/// Largest sample count accepted; one point array per sample must fit in a
/// mesh file.
pub const MAX_SAMPLE_COUNT: usize = u32::MAX as usize;

/// Relative distance from an integer under which `T / dt` snaps to it.
const SAMPLE_COUNT_TOLERANCE: f64 = 1e-9;

/// Cycle duration, sample interval and geometric scale factor.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CycleParameters {
    /// Cycle duration T in seconds.
    pub period: f64,
    /// Sample interval dt in seconds.
    pub dt: f64,
    /// Factor applied to coordinates before differentiation (mm -> m is 0.001).
    #[serde(default = "default_scale")]
    pub scale: f64,
}

fn default_scale() -> f64 {
    1.0
}

impl CycleParameters {
    /// Build and validate parameters.
    pub fn try_new(period: f64, dt: f64, scale: f64) -> Result<Self, MeshError> {
        let params = Self { period, dt, scale };
        params.validate()?;
        Ok(params)
    }

    /// Check `period`, `dt` and `scale` are finite and positive, and N >= 1.
    pub fn validate(&self) -> Result<(), MeshError> {
        for (name, value) in [("period", self.period), ("dt", self.dt), ("scale", self.scale)] {
            if !(value.is_finite() && value > 0.0) {
                return Err(MeshError::InvalidParameter(format!(
                    "{name} must be finite and > 0, got {value}"
                )));
            }
        }
        self.try_sample_count()?;
        Ok(())
    }

    /// Number of samples per cycle, `N = floor(T / dt)`.
    ///
    /// When `T / dt` is within a relative 1e-9 of an integer the integer is
    /// used, so representation error cannot drop a sample
    /// (`0.3 / 0.1 = 2.9999999999999996` gives 3).
    ///
    /// # Errors
    /// `InvalidParameter` if N is 0 or larger than [`MAX_SAMPLE_COUNT`].
    pub fn try_sample_count(&self) -> Result<usize, MeshError> {
        let ratio = self.period / self.dt;
        if !ratio.is_finite() || ratio < 0.0 {
            return Err(MeshError::InvalidParameter(format!(
                "period / dt = {ratio} is not a usable sample count"
            )));
        }
        let nearest = ratio.round();
        let n = if (ratio - nearest).abs() <= SAMPLE_COUNT_TOLERANCE * nearest.max(1.0) {
            nearest
        } else {
            ratio.floor()
        };
        if n < 1.0 {
            return Err(MeshError::InvalidParameter(format!(
                "dt = {} exceeds the cycle period {}; no samples",
                self.dt, self.period
            )));
        }
        if n > MAX_SAMPLE_COUNT as f64 {
            return Err(MeshError::InvalidParameter(format!(
                "period / dt = {ratio} exceeds {MAX_SAMPLE_COUNT} samples"
            )));
        }
        Ok(n as usize)
    }

    /// [`try_sample_count`](Self::try_sample_count), or 0 when the
    /// parameters admit no sample count. Validated parameters never give 0.
    pub fn sample_count(&self) -> usize {
        self.try_sample_count().unwrap_or(0)
    }
}

/// Full run configuration for the `tsvi` binary.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TsviConfig {
    #[serde(flatten)]
    pub cycle: CycleParameters,
    /// Source mesh file.
    pub input_path: PathBuf,
    /// Destination mesh file.
    pub output_path: PathBuf,
    /// Prefix of the time-indexed WSS point arrays.
    #[serde(default = "default_prefix")]
    pub array_prefix: String,
    /// Per-vertex averaging of triangle gradients.
    #[serde(default)]
    pub weighting: GradientWeighting,
}

fn default_prefix() -> String {
    DEFAULT_ARRAY_PREFIX.to_string()
}

impl TsviConfig {
    /// Parse a JSON configuration string and validate it.
    pub fn from_json(json: &str) -> Result<Self, MeshError> {
        let config: Self = serde_json::from_str(json)?;
        config.cycle.validate()?;
        Ok(config)
    }

    /// Read and validate a JSON configuration file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, MeshError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| MeshError::Config(format!("{}: {e}", path.display())))?;
        Self::from_json(&text)
    }

    /// The numerical part of the configuration.
    #[inline]
    pub fn cycle(&self) -> CycleParameters {
        self.cycle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_count_survives_representation_error() {
        assert_eq!(CycleParameters::try_new(1.0, 0.2, 1.0).unwrap().sample_count(), 5);
        assert_eq!(CycleParameters::try_new(0.3, 0.1, 1.0).unwrap().sample_count(), 3);
        assert_eq!(CycleParameters::try_new(0.8, 0.01, 1.0).unwrap().sample_count(), 80);
    }

    #[test]
    fn sample_count_drops_fractional_remainder() {
        let params = CycleParameters::try_new(1.0, 0.3, 1.0).unwrap();
        assert_eq!(params.sample_count(), 3);
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        assert!(CycleParameters::try_new(0.0, 0.1, 1.0).is_err());
        assert!(CycleParameters::try_new(1.0, -0.1, 1.0).is_err());
        assert!(CycleParameters::try_new(1.0, 0.1, f64::NAN).is_err());
        assert!(CycleParameters::try_new(0.1, 0.2, 1.0).is_err());
    }

    #[test]
    fn unrepresentable_sample_count_is_rejected() {
        assert!(matches!(
            CycleParameters::try_new(1e30, 1e-30, 1.0),
            Err(MeshError::InvalidParameter(_))
        ));
        assert!(matches!(
            CycleParameters::try_new(f64::MAX, f64::MIN_POSITIVE, 1.0),
            Err(MeshError::InvalidParameter(_))
        ));
        let unchecked = CycleParameters {
            period: 1e30,
            dt: 1e-30,
            scale: 1.0,
        };
        assert_eq!(unchecked.sample_count(), 0);
        let largest = CycleParameters::try_new(MAX_SAMPLE_COUNT as f64, 1.0, 1.0).unwrap();
        assert_eq!(largest.sample_count(), MAX_SAMPLE_COUNT);
    }

    #[test]
    fn json_defaults_apply() {
        let config = TsviConfig::from_json(
            r#"{ "period": 0.9, "dt": 0.01, "input_path": "a.vtk", "output_path": "b.vtk" }"#,
        )
        .unwrap();
        assert_eq!(config.cycle.scale, 1.0);
        assert_eq!(config.array_prefix, "WSS_");
        assert_eq!(config.weighting, GradientWeighting::Uniform);
        assert_eq!(config.cycle().sample_count(), 90);
    }

    #[test]
    fn json_overrides_and_validation() {
        let config = TsviConfig::from_json(
            r#"{ "period": 1.0, "dt": 0.25, "scale": 0.001, "input_path": "a.vtk",
                 "output_path": "b.vtk", "array_prefix": "wss_", "weighting": "area" }"#,
        )
        .unwrap();
        assert_eq!(config.weighting, GradientWeighting::Area);
        assert_eq!(config.array_prefix, "wss_");

        let err = TsviConfig::from_json(
            r#"{ "period": 1.0, "dt": 0.0, "input_path": "a", "output_path": "b" }"#,
        )
        .unwrap_err();
        assert!(matches!(err, MeshError::InvalidParameter(_)));

        let err = TsviConfig::from_json(r#"{ "period": 1.0 }"#).unwrap_err();
        assert!(matches!(err, MeshError::Config(_)));
    }
}
