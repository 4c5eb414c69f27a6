use std::path::Path;

use crate::error::{Result, SamplingError};
use crate::math::{Point3, Vector3};
use crate::points::{LabeledPoint, ParticleId};

use super::{ParticleParameters, SurfaceSampler};

/// Surface sampler that places a fixed point table at every particle.
///
/// Parameters are read as `(s0, s1, s2)` = particle position and an
/// optional `s3` = scale factor.
#[derive(Debug, Clone)]
pub struct TableSampler {
    offsets: Vec<Vector3>,
}

impl TableSampler {
    #[must_use]
    pub fn new(offsets: Vec<Vector3>) -> Self {
        Self { offsets }
    }

    /// Loads offsets from an `x y z` per line text file.
    ///
    /// # Errors
    ///
    /// Returns [`SamplingError::Read`] if the file cannot be read and
    /// [`SamplingError::Parse`] for lines that are not three numbers.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| SamplingError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut offsets = Vec::new();
        for (index, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let parse_error = |message: String| SamplingError::Parse {
                path: path.to_path_buf(),
                line: index + 1,
                message,
            };
            let values = line
                .split_whitespace()
                .map(str::parse::<f64>)
                .collect::<std::result::Result<Vec<f64>, _>>()
                .map_err(|e| parse_error(e.to_string()))?;
            let &[x, y, z] = values.as_slice() else {
                return Err(parse_error(format!("expected 3 values, got {}", values.len())).into());
            };
            offsets.push(Vector3::new(x, y, z));
        }
        Ok(Self::new(offsets))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }
}

impl SurfaceSampler for TableSampler {
    fn sample(
        &self,
        parameters: &ParticleParameters,
        label: ParticleId,
    ) -> Result<Vec<LabeledPoint>> {
        let v = parameters.values();
        if v.len() < 3 {
            return Err(SamplingError::MissingParameters {
                label: label.get(),
                needed: 3,
                got: v.len(),
            }
            .into());
        }
        let center = Point3::new(v[0], v[1], v[2]);
        let scale = v.get(3).copied().unwrap_or(1.0);
        Ok(self
            .offsets
            .iter()
            .map(|offset| LabeledPoint::new(center + offset * scale, label))
            .collect())
    }
}
