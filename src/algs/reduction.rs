//! Temporal reduction of per-sample divergence fields into mean and TSVI.
//!
//! For each vertex, over the N samples of one cycle,
//!
//! ```text
//! mean = (1/N) * sum_i div_i
//! TSVI = sqrt( (1/T) * dt * sum_i (div_i - mean)^2 )
//! ```
//!
//! Samples are folded one at a time with Welford's update (running mean and
//! running sum of squared deviations `M2`), so no stage ever holds all N
//! fields. Accumulators over disjoint sample sets combine with
//! [`TemporalAccumulator::merge`] (Chan et al. pairwise update), which is what
//! lets samples be processed in parallel.
//!
//! A vertex whose divergence never changes keeps `M2 == 0` exactly, so its
//! TSVI is exactly zero. NaN samples make the vertex NaN.

use crate::config::CycleParameters;
use crate::data::field::ScalarField;
use crate::mesh_error::MeshError;

/// Running per-vertex mean and squared-deviation sum.
#[derive(Clone, Debug, PartialEq)]
pub struct TemporalAccumulator {
    count: usize,
    mean: Vec<f64>,
    m2: Vec<f64>,
}

/// Result of [`TemporalAccumulator::finish`].
#[derive(Clone, Debug, PartialEq)]
pub struct TemporalStats {
    /// Cycle-averaged divergence per vertex.
    pub mean: ScalarField,
    /// Topological Shear Variation Index per vertex.
    pub tsvi: ScalarField,
    /// Number of samples folded.
    pub samples: usize,
}

impl TemporalAccumulator {
    /// Empty accumulator for `vertex_count` vertices.
    pub fn new(vertex_count: usize) -> Self {
        Self {
            count: 0,
            mean: vec![0.0; vertex_count],
            m2: vec![0.0; vertex_count],
        }
    }

    /// Samples folded so far.
    #[inline]
    pub fn count(&self) -> usize {
        self.count
    }

    /// Vertices tracked.
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.mean.len()
    }

    /// Fold one sample.
    ///
    /// # Errors
    /// `ShapeMismatch` if `sample` does not have one value per vertex.
    pub fn push(&mut self, sample: &ScalarField) -> Result<(), MeshError> {
        if sample.len() != self.vertex_count() {
            return Err(MeshError::ShapeMismatch {
                array: format!("divergence sample {}", self.count),
                expected: self.vertex_count(),
                found: sample.len(),
            });
        }
        self.count += 1;
        let n = self.count as f64;
        for ((mean, m2), &x) in self.mean.iter_mut().zip(self.m2.iter_mut()).zip(sample.as_slice()) {
            let delta = x - *mean;
            *mean += delta / n;
            *m2 += delta * (x - *mean);
        }
        Ok(())
    }

    /// Combine with an accumulator over a disjoint set of samples.
    ///
    /// # Errors
    /// `ShapeMismatch` if the two track different vertex counts.
    pub fn merge(mut self, other: Self) -> Result<Self, MeshError> {
        if other.vertex_count() != self.vertex_count() {
            return Err(MeshError::ShapeMismatch {
                array: "temporal accumulator".into(),
                expected: self.vertex_count(),
                found: other.vertex_count(),
            });
        }
        if other.count == 0 {
            return Ok(self);
        }
        if self.count == 0 {
            return Ok(other);
        }
        let na = self.count as f64;
        let nb = other.count as f64;
        let n = na + nb;
        for v in 0..self.mean.len() {
            let delta = other.mean[v] - self.mean[v];
            self.mean[v] += delta * nb / n;
            self.m2[v] += other.m2[v] + delta * delta * na * nb / n;
        }
        self.count += other.count;
        Ok(self)
    }

    /// Produce mean and TSVI for one cycle.
    ///
    /// # Errors
    /// `SampleCountMismatch` unless exactly `params.sample_count()` samples
    /// were folded.
    pub fn finish(self, params: &CycleParameters) -> Result<TemporalStats, MeshError> {
        let expected = params.sample_count();
        if self.count != expected {
            return Err(MeshError::SampleCountMismatch {
                expected,
                found: self.count,
            });
        }
        let factor = params.dt / params.period;
        let tsvi = self.m2.iter().map(|&m2| (factor * m2).sqrt()).collect();
        Ok(TemporalStats {
            mean: ScalarField::new(self.mean),
            tsvi: ScalarField::new(tsvi),
            samples: self.count,
        })
    }
}

/// Reduce an in-memory list of divergence fields.
pub fn reduce_samples(
    samples: &[ScalarField],
    params: &CycleParameters,
) -> Result<TemporalStats, MeshError> {
    let vertex_count = samples.first().map_or(0, ScalarField::len);
    let mut acc = TemporalAccumulator::new(vertex_count);
    for sample in samples {
        acc.push(sample)?;
    }
    acc.finish(params)
}
