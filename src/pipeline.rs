//! End-to-end set Voronoi run.

use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::Path;

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::{info, warn};

use crate::config::Config;
use crate::dedup::{UniformGrid, DEFAULT_BUCKETS};
use crate::error::{CellError, OutputError, Result};
use crate::math::{Domain, Point3};
use crate::merge::{BoundaryFace, CellMerger, PeriodicUnwrap};
use crate::mesh::{write_poly, ConsolidatedMesh, DroppedFace, MeshAssembler};
use crate::points::{ParticleId, PointPattern};
use crate::sampling::{sample_particles, ParticleParameters, SurfaceSampler};
use crate::tessellation::{
    cell_statistics, write_statistics, CellOutcome, CellStatistics, TessellationEngine,
};

/// Conditionally parallel iterator over a slice.
macro_rules! maybe_par_iter {
    ($slice:expr) => {{
        #[cfg(feature = "parallel")]
        {
            $slice.par_iter()
        }
        #[cfg(not(feature = "parallel"))]
        {
            $slice.iter()
        }
    }};
}

/// Cleaned sample dump.
pub const POINT_PATTERN_FILE: &str = "pointpattern.xyz";
/// Seed file handed to the tessellation engine.
pub const SEED_FILE: &str = "seeds.dat";
/// Per-cell statistics dump.
pub const STATISTICS_FILE: &str = "cells.stat";
/// Raw boundary vertices before consolidation.
pub const REDUCED_FILE: &str = "reduced.xyz";
/// Final mesh.
pub const POLY_FILE: &str = "setvoronoi.poly";

/// A seed left out of the mesh, with the reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedSeed {
    pub seed: usize,
    pub reason: CellError,
}

/// Counters describing a finished run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineReport {
    pub particles: usize,
    pub sampled_points: usize,
    /// Samples outside a non-periodic axis of the domain.
    pub dropped_out_of_domain: usize,
    pub duplicate_samples: usize,
    pub cleaned_points: usize,
    pub seeds: usize,
    pub skipped_seeds: Vec<SkippedSeed>,
    pub boundary_faces: usize,
    pub merged_vertices: usize,
    pub dropped_faces: Vec<DroppedFace>,
    pub mesh_points: usize,
    pub mesh_faces: usize,
}

/// Everything a run produces, held in memory until written.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Samples handed to the tessellation engine.
    pub cleaned: PointPattern,
    pub statistics: Vec<CellStatistics>,
    /// Boundary face vertices before consolidation.
    pub reduced: PointPattern,
    pub mesh: ConsolidatedMesh,
    pub report: PipelineReport,
}

/// Batch run from particle parameters to the consolidated mesh.
#[derive(Debug, Clone)]
pub struct Pipeline {
    domain: Domain,
    epsilon: f64,
    sample_epsilon: f64,
    grid: [usize; 3],
    unwrap: PeriodicUnwrap,
}

impl Pipeline {
    /// Creates a pipeline with the default sample grid and minimum-image
    /// wrap threshold. Both passes use `epsilon`.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`](crate::error::ConfigError) if `epsilon` does
    /// not fit the default grid.
    pub fn new(domain: Domain, epsilon: f64) -> Result<Self> {
        let unwrap = PeriodicUnwrap::new(&domain, None)?;
        let pipeline = Self {
            domain,
            epsilon,
            sample_epsilon: epsilon,
            grid: DEFAULT_BUCKETS,
            unwrap,
        };
        pipeline.validate()?;
        Ok(pipeline)
    }

    /// Builds a pipeline from a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`](crate::error::ConfigError) for invalid values.
    pub fn from_config(config: &Config) -> Result<Self> {
        let domain = config.domain()?;
        let unwrap = PeriodicUnwrap::new(&domain, config.wrap_threshold)?;
        let pipeline = Self {
            domain,
            epsilon: config.epsilon,
            sample_epsilon: config.sample_epsilon(),
            grid: config.grid,
            unwrap,
        };
        pipeline.validate()?;
        Ok(pipeline)
    }

    /// Replaces the sample cleaning tolerance and grid.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`](crate::error::ConfigError) if the grid
    /// buckets are smaller than `epsilon`.
    pub fn with_sample_cleaning(mut self, epsilon: f64, grid: [usize; 3]) -> Result<Self> {
        self.sample_epsilon = epsilon;
        self.grid = grid;
        self.validate()?;
        Ok(self)
    }

    /// Replaces the wrap threshold.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`](crate::error::ConfigError) for a
    /// non-positive threshold.
    pub fn with_wrap_threshold(mut self, threshold: [f64; 3]) -> Result<Self> {
        self.unwrap = PeriodicUnwrap::new(&self.domain, Some(threshold))?;
        Ok(self)
    }

    #[must_use]
    pub fn domain(&self) -> &Domain {
        &self.domain
    }

    fn validate(&self) -> Result<()> {
        MeshAssembler::new(self.epsilon)?;
        UniformGrid::new(&self.domain, self.grid)?.validate_tolerance(self.sample_epsilon)?;
        Ok(())
    }

    /// Samples every particle, then runs [`Pipeline::execute_points`].
    ///
    /// # Errors
    ///
    /// Returns an error if sampling, the engine or consolidation fails.
    pub fn execute<S, E>(
        &self,
        particles: &[ParticleParameters],
        sampler: &S,
        engine: &E,
    ) -> Result<PipelineOutput>
    where
        S: SurfaceSampler + ?Sized,
        E: TessellationEngine + ?Sized,
    {
        let pattern = sample_particles(sampler, particles)?;
        let mut output = self.execute_points(pattern, engine)?;
        output.report.particles = particles.len();
        Ok(output)
    }

    /// Runs the pipeline on already sampled points.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine or consolidation fails. Seeds whose
    /// cells cannot be used are skipped and listed in the report.
    pub fn execute_points<E>(&self, mut pattern: PointPattern, engine: &E) -> Result<PipelineOutput>
    where
        E: TessellationEngine + ?Sized,
    {
        let mut report = PipelineReport {
            particles: pattern.reference_frames().len(),
            sampled_points: pattern.len(),
            ..PipelineReport::default()
        };

        // Anchors come from the raw samples, before wrapping
        let frames = pattern.reference_frames();
        report.dropped_out_of_domain = pattern.wrap_into(&self.domain);
        if report.dropped_out_of_domain > 0 {
            warn!(dropped = report.dropped_out_of_domain, "samples outside the domain were dropped");
        }
        let grid = UniformGrid::new(&self.domain, self.grid)?;
        report.duplicate_samples = pattern.remove_duplicates(self.sample_epsilon, grid)?;
        report.cleaned_points = pattern.len();
        info!(
            sampled = report.sampled_points,
            cleaned = report.cleaned_points,
            duplicates = report.duplicate_samples,
            "cleaned samples"
        );

        let seeds: Vec<Point3> = pattern.iter().map(|p| p.position).collect();
        let labels: Vec<ParticleId> = pattern.iter().map(|p| p.label).collect();
        report.seeds = seeds.len();
        let outcomes = engine.tessellate(&self.domain, &seeds)?;
        let statistics = cell_statistics(&outcomes);

        let merger = CellMerger::new(&labels, &frames, self.unwrap.clone());
        type Merged = std::result::Result<Vec<BoundaryFace>, CellError>;
        let merged: Vec<Merged> = maybe_par_iter!(outcomes)
            .map(|outcome| match outcome {
                CellOutcome::Computed(cell) => merger.merge(cell),
                CellOutcome::Degenerate { seed } => Err(CellError::Degenerate { seed: *seed }),
            })
            .collect();

        // Single writer, in seed order
        let mut assembler = MeshAssembler::new(self.epsilon)?;
        for (outcome, result) in outcomes.iter().zip(merged) {
            match result {
                Ok(faces) => {
                    report.boundary_faces += faces.len();
                    assembler.ingest_all(faces);
                }
                Err(reason) => {
                    warn!(seed = outcome.seed(), %reason, "skipping seed");
                    report.skipped_seeds.push(SkippedSeed {
                        seed: outcome.seed(),
                        reason,
                    });
                }
            }
        }
        info!(
            faces = report.boundary_faces,
            skipped = report.skipped_seeds.len(),
            "merged seed cells"
        );

        let reduced = assembler.raw_points();
        let (mesh, consolidation) = assembler.consolidate()?;
        report.merged_vertices = consolidation.merged_vertices;
        report.dropped_faces = consolidation.dropped_faces;
        report.mesh_points = mesh.num_points();
        report.mesh_faces = mesh.num_faces();

        Ok(PipelineOutput {
            cleaned: pattern,
            statistics,
            reduced,
            mesh,
            report,
        })
    }
}

impl PipelineOutput {
    /// Writes every artifact into `dir`, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns an [`OutputError`] if the directory or a file cannot be
    /// written.
    pub fn write_to(&self, dir: &Path) -> Result<()> {
        prepare_output_dir(dir)?;
        write_file(&dir.join(STATISTICS_FILE), |out| write_statistics(out, &self.statistics))?;
        write_file(&dir.join(POINT_PATTERN_FILE), |out| write!(out, "{}", self.cleaned))?;
        write_file(&dir.join(REDUCED_FILE), |out| write!(out, "{}", self.reduced))?;
        write_file(&dir.join(POLY_FILE), |out| write_poly(out, &self.mesh))?;
        info!(dir = %dir.display(), "wrote artifacts");
        Ok(())
    }
}

/// Creates the output directory if it does not exist.
///
/// # Errors
///
/// Returns [`OutputError::EmptyPath`] for an empty path and
/// [`OutputError::CreateDir`] if the directory cannot be created.
pub fn prepare_output_dir(dir: &Path) -> Result<()> {
    if dir.as_os_str().is_empty() {
        return Err(OutputError::EmptyPath.into());
    }
    fs::create_dir_all(dir).map_err(|source| OutputError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })?;
    Ok(())
}

fn write_file<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<fs::File>) -> io::Result<()>,
{
    let to_error = |source| OutputError::Write {
        path: path.to_path_buf(),
        source,
    };
    let file = fs::File::create(path).map_err(to_error)?;
    let mut out = BufWriter::new(file);
    write(&mut out).map_err(to_error)?;
    out.flush().map_err(to_error)?;
    Ok(())
}
