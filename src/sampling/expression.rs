use fasteval::{Compiler, Evaler, Instruction, Slab};
use serde::Deserialize;

use crate::error::{ConfigError, Result, SamplingError};
use crate::math::Point3;
use crate::points::{LabeledPoint, ParticleId};

use super::{ParticleParameters, SurfaceSampler};

/// Closed sampling interval for one surface parameter.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ParameterRange {
    pub min: f64,
    pub max: f64,
    pub steps: usize,
}

impl ParameterRange {
    #[must_use]
    pub fn new(min: f64, max: f64, steps: usize) -> Self {
        Self { min, max, steps }
    }

    /// Value at step `i`. Both ends are included when `steps > 1`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn value(&self, i: usize) -> f64 {
        if self.steps <= 1 {
            return self.min;
        }
        self.min + (self.max - self.min) * i as f64 / (self.steps - 1) as f64
    }
}

/// One compiled coordinate expression.
#[derive(Debug)]
struct CompiledExpression {
    source: String,
    instruction: Instruction,
    slab: Slab,
}

impl CompiledExpression {
    fn compile(source: &str) -> Result<Self> {
        let parser = fasteval::Parser::new();
        let mut slab = Slab::new();
        let instruction = parser
            .parse(source, &mut slab.ps)
            .map_err(|e| SamplingError::Expression {
                expression: source.to_string(),
                message: e.to_string(),
            })?
            .from(&slab.ps)
            .compile(&slab.ps, &mut slab.cs);
        Ok(Self {
            source: source.to_string(),
            instruction,
            slab,
        })
    }

    fn eval(&self, u: f64, v: f64, parameters: &[f64]) -> Result<f64> {
        let mut ns = |name: &str, _args: Vec<f64>| -> Option<f64> {
            match name {
                "u" => Some(u),
                "v" => Some(v),
                _ => parameter_index(name).and_then(|i| parameters.get(i).copied()),
            }
        };
        let value = self
            .instruction
            .eval(&self.slab, &mut ns)
            .map_err(|e| SamplingError::Expression {
                expression: self.source.clone(),
                message: e.to_string(),
            })?;
        Ok(value)
    }
}

/// Index `i` of a particle parameter variable `s<i>`.
fn parameter_index(name: &str) -> Option<usize> {
    name.strip_prefix('s')?.parse().ok()
}

/// Number of particle parameters an expression refers to.
fn required_parameters(source: &str) -> usize {
    source
        .split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .filter_map(parameter_index)
        .map(|i| i + 1)
        .max()
        .unwrap_or(0)
}

/// Surface sampler driven by three parametric coordinate expressions.
///
/// The expressions see the surface parameters `u` and `v` and the particle
/// parameters `s0`, `s1`, ... Points are produced for every `(u, v)` pair,
/// `u` in the outer loop.
#[derive(Debug)]
pub struct ExpressionSampler {
    coordinates: [CompiledExpression; 3],
    u: ParameterRange,
    v: ParameterRange,
    required: usize,
}

impl ExpressionSampler {
    /// Compiles the coordinate expressions.
    ///
    /// # Errors
    ///
    /// Returns [`SamplingError::Expression`] if an expression does not parse
    /// and [`ConfigError::Invalid`] if a range has zero steps.
    pub fn new(
        x: &str,
        y: &str,
        z: &str,
        u: ParameterRange,
        v: ParameterRange,
    ) -> Result<Self> {
        for (name, range) in [("u", &u), ("v", &v)] {
            if range.steps == 0 {
                return Err(ConfigError::Invalid(format!(
                    "range `{name}` needs at least one step"
                ))
                .into());
            }
        }
        let required = [x, y, z].iter().map(|s| required_parameters(s)).max().unwrap_or(0);
        Ok(Self {
            coordinates: [
                CompiledExpression::compile(x)?,
                CompiledExpression::compile(y)?,
                CompiledExpression::compile(z)?,
            ],
            u,
            v,
            required,
        })
    }

    /// Number of points produced per particle.
    #[must_use]
    pub fn samples_per_particle(&self) -> usize {
        self.u.steps * self.v.steps
    }
}

impl SurfaceSampler for ExpressionSampler {
    fn sample(
        &self,
        parameters: &ParticleParameters,
        label: ParticleId,
    ) -> Result<Vec<LabeledPoint>> {
        if parameters.len() < self.required {
            return Err(SamplingError::MissingParameters {
                label: label.get(),
                needed: self.required,
                got: parameters.len(),
            }
            .into());
        }
        let values = parameters.values();
        let mut points = Vec::with_capacity(self.samples_per_particle());
        for i in 0..self.u.steps {
            let u = self.u.value(i);
            for j in 0..self.v.steps {
                let v = self.v.value(j);
                let [x, y, z] = &self.coordinates;
                let position = Point3::new(
                    x.eval(u, v, values)?,
                    y.eval(u, v, values)?,
                    z.eval(u, v, values)?,
                );
                points.push(LabeledPoint::new(position, label));
            }
        }
        Ok(points)
    }
}
