//! Turning particle parameter sets into labeled surface samples.

mod expression;
mod parameters;
mod table;

pub use expression::{ExpressionSampler, ParameterRange};
pub use parameters::{read_parameter_file, ParticleParameters};
pub use table::TableSampler;

use tracing::info;

use crate::error::Result;
use crate::points::{LabeledPoint, ParticleId, PointPattern};

/// Capability that places surface samples for one particle.
pub trait SurfaceSampler {
    /// Samples the surface of the particle described by `parameters`,
    /// tagging every point with `label`.
    ///
    /// # Errors
    ///
    /// Returns an error if the parameters do not fit the shape.
    fn sample(&self, parameters: &ParticleParameters, label: ParticleId)
        -> Result<Vec<LabeledPoint>>;
}

/// Samples every particle in order; particle `i` (0-based) gets label `i + 1`.
///
/// # Errors
///
/// Propagates the first sampler error.
pub fn sample_particles<S: SurfaceSampler + ?Sized>(
    sampler: &S,
    particles: &[ParticleParameters],
) -> Result<PointPattern> {
    let mut pattern = PointPattern::new();
    for (index, parameters) in particles.iter().enumerate() {
        let label = ParticleId::new(u32::try_from(index + 1).unwrap_or(u32::MAX));
        pattern.extend(sampler.sample(parameters, label)?);
    }
    info!(
        particles = particles.len(),
        points = pattern.len(),
        "sampled particle surfaces"
    );
    Ok(pattern)
}
