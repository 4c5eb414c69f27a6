//! Run configuration, loaded from a TOML file.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::dedup::{UniformGrid, DEFAULT_BUCKETS};
use crate::error::{ConfigError, Result};
use crate::math::{Domain, Point3};
use crate::merge::PeriodicUnwrap;
use crate::sampling::{ExpressionSampler, ParameterRange, SurfaceSampler, TableSampler};

/// Validated run configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Particle parameter file.
    pub positions: PathBuf,
    /// Vertex merge tolerance.
    pub epsilon: f64,
    /// Sample cleaning tolerance; defaults to `epsilon`.
    #[serde(default)]
    pub sample_epsilon: Option<f64>,
    pub boundary: String,
    #[serde(default)]
    pub periodic: Option<PeriodicFlags>,
    #[serde(default = "default_grid")]
    pub grid: [usize; 3],
    #[serde(default)]
    pub wrap_threshold: Option<[f64; 3]>,
    pub domain: DomainConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    pub shape: ShapeConfig,
}

fn default_grid() -> [usize; 3] {
    DEFAULT_BUCKETS
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DomainConfig {
    pub xmin: f64,
    pub xmax: f64,
    pub ymin: f64,
    pub ymax: f64,
    pub zmin: f64,
    pub zmax: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PeriodicFlags {
    #[serde(default)]
    pub x: bool,
    #[serde(default)]
    pub y: bool,
    #[serde(default)]
    pub z: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    #[serde(default = "default_program")]
    pub program: String,
    /// Also write the cells as a gnuplot wireframe.
    #[serde(default)]
    pub gnuplot: bool,
}

fn default_program() -> String {
    "voro++".to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            gnuplot: false,
        }
    }
}

/// Surface sampler selection.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ShapeConfig {
    Expression {
        x: String,
        y: String,
        z: String,
        u: ParameterRange,
        v: ParameterRange,
    },
    Table {
        file: PathBuf,
    },
}

/// Whether the domain wraps around.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryMode {
    None,
    Periodic(PeriodicFlags),
}

impl Config {
    /// Reads, parses and validates a configuration file.
    ///
    /// Relative paths inside the file resolve against its directory.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file cannot be read or parsed, or a
    /// value is invalid.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&text).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        config.resolve(path.parent().unwrap_or_else(|| Path::new("")))
    }

    /// Parses and validates configuration text, resolving relative paths
    /// against `base`.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for invalid TOML or values.
    pub fn parse(text: &str, base: &Path) -> Result<Self> {
        let config: Self = toml::from_str(text).map_err(|e| ConfigError::Parse {
            path: PathBuf::new(),
            message: e.to_string(),
        })?;
        config.resolve(base)
    }

    fn resolve(mut self, base: &Path) -> Result<Self> {
        self.positions = base.join(&self.positions);
        if let ShapeConfig::Table { file } = &mut self.shape {
            *file = base.join(&*file);
        }
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<()> {
        let domain = self.domain()?;
        positive("epsilon", self.epsilon)?;
        positive("sample_epsilon", self.sample_epsilon())?;
        UniformGrid::new(&domain, self.grid)?.validate_tolerance(self.sample_epsilon())?;
        PeriodicUnwrap::new(&domain, self.wrap_threshold)?;
        if let ShapeConfig::Expression { u, v, .. } = &self.shape {
            for (name, range) in [("u", u), ("v", v)] {
                if range.steps == 0 || !range.min.is_finite() || !range.max.is_finite() {
                    return Err(ConfigError::Invalid(format!(
                        "shape range `{name}` needs finite bounds and at least one step"
                    ))
                    .into());
                }
            }
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownBoundary`] for an unknown mode and
    /// [`ConfigError::MissingPeriodicFlags`] if periodic flags are missing.
    pub fn boundary_mode(&self) -> std::result::Result<BoundaryMode, ConfigError> {
        match (self.boundary.as_str(), self.periodic) {
            ("periodic", Some(flags)) => Ok(BoundaryMode::Periodic(flags)),
            ("periodic", None) => Err(ConfigError::MissingPeriodicFlags),
            ("none", None) => Ok(BoundaryMode::None),
            ("none", Some(_)) => Err(ConfigError::Invalid(
                "`periodic` flags given but boundary is `none`".to_string(),
            )),
            (other, _) => Err(ConfigError::UnknownBoundary(other.to_string())),
        }
    }

    /// Simulation box with its periodic flags.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for invalid bounds or boundary settings.
    pub fn domain(&self) -> std::result::Result<Domain, ConfigError> {
        let periodic = match self.boundary_mode()? {
            BoundaryMode::None => [false; 3],
            BoundaryMode::Periodic(f) => [f.x, f.y, f.z],
        };
        let d = &self.domain;
        Domain::new(
            Point3::new(d.xmin, d.ymin, d.zmin),
            Point3::new(d.xmax, d.ymax, d.zmax),
            periodic,
        )
    }

    #[must_use]
    pub fn sample_epsilon(&self) -> f64 {
        self.sample_epsilon.unwrap_or(self.epsilon)
    }

    /// Builds the configured surface sampler.
    ///
    /// # Errors
    ///
    /// Returns an error if an expression does not compile or the point
    /// table cannot be read.
    pub fn sampler(&self) -> Result<Box<dyn SurfaceSampler>> {
        let sampler: Box<dyn SurfaceSampler> = match &self.shape {
            ShapeConfig::Expression { x, y, z, u, v } => {
                Box::new(ExpressionSampler::new(x, y, z, *u, *v)?)
            }
            ShapeConfig::Table { file } => Box::new(TableSampler::from_file(file)?),
        };
        Ok(sampler)
    }
}

fn positive(name: &'static str, value: f64) -> std::result::Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NonPositive { name, value })
    }
}
