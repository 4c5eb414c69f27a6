use std::path::Path;

use crate::error::{Result, SamplingError};

/// Free-form parameter vector of one particle (position, size, orientation...).
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleParameters {
    values: Vec<f64>,
}

impl ParticleParameters {
    #[must_use]
    pub fn new(values: Vec<f64>) -> Self {
        Self { values }
    }

    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Reads one parameter set per line.
///
/// Values are whitespace-separated floats. Blank lines and lines starting
/// with `#` are skipped.
///
/// # Errors
///
/// Returns [`SamplingError::Read`] if the file cannot be read and
/// [`SamplingError::Parse`] for a token that is not a number.
pub fn read_parameter_file(path: &Path) -> Result<Vec<ParticleParameters>> {
    let text = std::fs::read_to_string(path).map_err(|source| SamplingError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_parameters(&text, path)
}

fn parse_parameters(text: &str, path: &Path) -> Result<Vec<ParticleParameters>> {
    let mut particles = Vec::new();
    for (index, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let values = line
            .split_whitespace()
            .map(|token| {
                token.parse::<f64>().map_err(|e| SamplingError::Parse {
                    path: path.to_path_buf(),
                    line: index + 1,
                    message: format!("`{token}`: {e}"),
                })
            })
            .collect::<std::result::Result<Vec<f64>, _>>()?;
        particles.push(ParticleParameters::new(values));
    }
    Ok(particles)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::SetVoronoiError;
    use std::io::Write;

    #[test]
    fn parses_sets_and_skips_comments() {
        let text = "# x y z r\n1.0 2.0 3.0 0.5\n\n  4 5 6 1e-1  \n";
        let sets = parse_parameters(text, Path::new("mem")).unwrap();
        assert_eq!(sets.len(), 2);
        assert_eq!(sets[1].values(), &[4.0, 5.0, 6.0, 0.1]);
    }

    #[test]
    fn reports_line_of_bad_token() {
        let err = parse_parameters("1 2 3\n1 x 3\n", Path::new("mem")).unwrap_err();
        match err {
            SetVoronoiError::Sampling(SamplingError::Parse { line, .. }) => assert_eq!(line, 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn reads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "0.5 0.5 0.5").unwrap();
        let sets = read_parameter_file(file.path()).unwrap();
        assert_eq!(sets, vec![ParticleParameters::new(vec![0.5, 0.5, 0.5])]);
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = read_parameter_file(Path::new("/nonexistent/particles.dat")).unwrap_err();
        assert!(matches!(err, SetVoronoiError::Sampling(SamplingError::Read { .. })));
    }
}
