use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for set Voronoi construction.
#[derive(Debug, Error)]
pub enum SetVoronoiError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Sampling(#[from] SamplingError),

    #[error(transparent)]
    Tessellation(#[from] TessellationError),

    #[error(transparent)]
    Cell(#[from] CellError),

    #[error(transparent)]
    Consolidation(#[from] ConsolidationError),

    #[error(transparent)]
    Output(#[from] OutputError),
}

/// Errors in the run configuration. Always fatal, raised before computation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("invalid bounding box on axis {axis}: min {min} must be below max {max}")]
    InvalidBounds { axis: char, min: f64, max: f64 },

    #[error("{name} must be a positive finite number, got {value}")]
    NonPositive { name: &'static str, value: f64 },

    #[error("unknown boundary mode `{0}` (expected `periodic` or `none`)")]
    UnknownBoundary(String),

    #[error("boundary mode `periodic` requires a `periodic` table with x/y/z flags")]
    MissingPeriodicFlags,

    #[error("grid needs at least one bucket per axis, got {0:?}")]
    EmptyGrid([usize; 3]),

    #[error(
        "bucket edge {bucket} on axis {axis} is smaller than epsilon {epsilon}; \
         duplicates could be missed"
    )]
    BucketTooSmall { axis: char, bucket: f64, epsilon: f64 },

    #[error("invalid value: {0}")]
    Invalid(String),
}

/// Errors while turning particle parameters into surface samples.
#[derive(Debug, Error)]
pub enum SamplingError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{path}:{line}: {message}")]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("expression `{expression}`: {message}")]
    Expression { expression: String, message: String },

    #[error("particle {label} needs at least {needed} parameters, got {got}")]
    MissingParameters { label: u32, needed: usize, got: usize },
}

/// Errors raised by the tessellation engine as a whole.
///
/// A single seed whose cell cannot be computed is not an error here; it is
/// reported as a degenerate [`CellOutcome`](crate::tessellation::CellOutcome).
#[derive(Debug, Error)]
pub enum TessellationError {
    #[error("failed to launch tessellation engine `{program}`: {source}")]
    Launch {
        program: String,
        source: std::io::Error,
    },

    #[error("tessellation engine `{program}` exited with {status}")]
    Failed { program: String, status: String },

    #[error("failed to read engine output {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("engine output line {line}: {message}")]
    Parse { line: usize, message: String },
}

/// Per-seed failures. Recovered by skipping the seed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CellError {
    #[error("seed {seed}: tessellation engine could not compute the cell")]
    Degenerate { seed: usize },

    #[error("seed {seed}: malformed face adjacency: {message}")]
    MalformedAdjacency { seed: usize, message: String },

    #[error("seed {seed}: face references unknown neighbor seed {neighbor}")]
    UnknownNeighbor { seed: usize, neighbor: i64 },

    #[error("seed {seed} has no particle label")]
    UnknownSeed { seed: usize },
}

/// Errors raised while consolidating the global mesh.
#[derive(Debug, Error)]
pub enum ConsolidationError {
    #[error("alias chain starting at vertex {vertex} revisits vertex {revisited}")]
    AliasCycle { vertex: usize, revisited: usize },

    #[error("alias of vertex {vertex} points at unknown vertex {target}")]
    DanglingAlias { vertex: usize, target: usize },

    #[error("face references a vertex that is not in the mesh")]
    MissingVertex,
}

/// Errors writing artifacts to disk.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("output directory path is empty")]
    EmptyPath,

    #[error("failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience type alias for results using [`SetVoronoiError`].
pub type Result<T> = std::result::Result<T, SetVoronoiError>;
