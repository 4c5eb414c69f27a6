use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, info};

use crate::error::{OutputError, Result, TessellationError};
use crate::math::{Domain, Point3};

use super::{parse_cell_line, CellOutcome, TessellationEngine};

/// Custom output format: id, position, volume, surface area, vertex
/// positions, face vertex lists and face neighbors.
const CELL_FORMAT: &str = "%i %q %v %F %w %P %s %t %n";

/// Tessellation engine backed by the `voro++` command-line program.
#[derive(Debug, Clone)]
pub struct VoroCommand {
    program: String,
    seed_file: PathBuf,
    gnuplot: bool,
}

impl VoroCommand {
    /// Creates an engine that writes its seed file to `seed_file` and reads
    /// the cells back from `<seed_file>.vol`.
    #[must_use]
    pub fn new(program: impl Into<String>, seed_file: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            seed_file: seed_file.into(),
            gnuplot: false,
        }
    }

    /// Asks the engine for a gnuplot wireframe of all cells as well.
    #[must_use]
    pub fn with_gnuplot(mut self, enabled: bool) -> Self {
        self.gnuplot = enabled;
        self
    }

    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Path of the engine's cell output.
    #[must_use]
    pub fn output_file(&self) -> PathBuf {
        let mut name = self.seed_file.clone().into_os_string();
        name.push(".vol");
        PathBuf::from(name)
    }

    /// Path of the gnuplot wireframe, if requested.
    #[must_use]
    pub fn gnuplot_file(&self) -> Option<PathBuf> {
        if !self.gnuplot {
            return None;
        }
        let mut name = self.seed_file.clone().into_os_string();
        name.push("_v.gnu");
        Some(PathBuf::from(name))
    }

    /// Command-line arguments for one run over `domain`.
    #[must_use]
    pub fn arguments(&self, domain: &Domain) -> Vec<String> {
        let mut args = vec!["-c".to_string(), CELL_FORMAT.to_string()];
        if self.gnuplot {
            args.push("-g".to_string());
        }
        for (axis, flag) in ["-px", "-py", "-pz"].iter().enumerate() {
            if domain.is_periodic(axis) {
                args.push((*flag).to_string());
            }
        }
        for axis in 0..3 {
            args.push(domain.min()[axis].to_string());
            args.push(domain.max()[axis].to_string());
        }
        args.push(self.seed_file.display().to_string());
        args
    }

    fn write_seeds(&self, seeds: &[Point3]) -> Result<()> {
        let write_error = |source| OutputError::Write {
            path: self.seed_file.clone(),
            source,
        };
        let file = fs::File::create(&self.seed_file).map_err(write_error)?;
        let mut out = BufWriter::new(file);
        for (id, seed) in seeds.iter().enumerate() {
            writeln!(out, "{id} {} {} {}", seed.x, seed.y, seed.z).map_err(write_error)?;
        }
        out.flush().map_err(write_error)?;
        Ok(())
    }
}

impl TessellationEngine for VoroCommand {
    fn tessellate(&self, domain: &Domain, seeds: &[Point3]) -> Result<Vec<CellOutcome>> {
        self.write_seeds(seeds)?;

        let args = self.arguments(domain);
        debug!(program = %self.program, ?args, "launching tessellation engine");
        let status = Command::new(&self.program)
            .args(&args)
            .status()
            .map_err(|source| TessellationError::Launch {
                program: self.program.clone(),
                source,
            })?;
        if !status.success() {
            return Err(TessellationError::Failed {
                program: self.program.clone(),
                status: status.to_string(),
            }
            .into());
        }

        let outcomes = read_cells(&self.output_file(), seeds.len())?;
        let computed = outcomes
            .iter()
            .filter(|o| matches!(o, CellOutcome::Computed(_)))
            .count();
        info!(seeds = seeds.len(), computed, "tessellation finished");
        Ok(outcomes)
    }
}

/// Reads an engine output file, returning one outcome per seed id in
/// `0..seed_count`. Seeds without a line are degenerate.
///
/// # Errors
///
/// Returns [`TessellationError::Read`] if the file cannot be read and
/// [`TessellationError::Parse`] for malformed lines or unknown seed ids.
fn read_cells(path: &Path, seed_count: usize) -> Result<Vec<CellOutcome>> {
    let text = fs::read_to_string(path).map_err(|source| TessellationError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_cells(&text, seed_count)
}

fn parse_cells(text: &str, seed_count: usize) -> Result<Vec<CellOutcome>> {
    let mut outcomes: Vec<CellOutcome> = (0..seed_count)
        .map(|seed| CellOutcome::Degenerate { seed })
        .collect();
    for (index, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let cell = parse_cell_line(line, index + 1)?;
        let Some(slot) = outcomes.get_mut(cell.seed) else {
            return Err(TessellationError::Parse {
                line: index + 1,
                message: format!("seed id {} out of range 0..{seed_count}", cell.seed),
            }
            .into());
        };
        *slot = CellOutcome::Computed(cell);
    }
    Ok(outcomes)
}
