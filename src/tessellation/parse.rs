use std::str::SplitWhitespace;

use crate::error::TessellationError;
use crate::math::Point3;

use super::{flatten_faces, RawCell};

/// Parses one line of `voro++` output written with the custom format
/// `%i %q %v %F %w %P %s %t %n`.
///
/// `line` is the 1-based line number used in error messages.
///
/// # Errors
///
/// Returns [`TessellationError::Parse`] if the line does not follow the
/// format.
pub fn parse_cell_line(text: &str, line: usize) -> Result<RawCell, TessellationError> {
    let mut tokens = Tokens {
        inner: text.split_whitespace(),
        line,
    };

    let seed = tokens.next_parsed::<usize>("seed id")?;
    let position = Point3::new(
        tokens.next_parsed("x")?,
        tokens.next_parsed("y")?,
        tokens.next_parsed("z")?,
    );
    let volume = tokens.next_parsed::<f64>("volume")?;
    let surface_area = tokens.next_parsed::<f64>("surface area")?;

    let vertex_count = tokens.next_parsed::<usize>("vertex count")?;
    let mut vertices = Vec::with_capacity(vertex_count);
    for _ in 0..vertex_count {
        let coords = tokens.next_tuple::<f64>("vertex")?;
        let &[x, y, z] = coords.as_slice() else {
            return Err(tokens.error(format!("vertex has {} coordinates", coords.len())));
        };
        vertices.push(Point3::new(x, y, z));
    }

    let face_count = tokens.next_parsed::<usize>("face count")?;
    let mut faces = Vec::with_capacity(face_count);
    for _ in 0..face_count {
        faces.push(tokens.next_tuple::<usize>("face")?);
    }
    let mut neighbors = Vec::with_capacity(face_count);
    for _ in 0..face_count {
        neighbors.push(tokens.next_parsed::<i32>("neighbor id")?);
    }
    if let Some(extra) = tokens.inner.next() {
        return Err(tokens.error(format!("unexpected trailing token `{extra}`")));
    }

    Ok(RawCell {
        seed,
        position,
        vertices,
        face_vertices: flatten_faces(&faces),
        neighbors,
        surface_area,
        volume,
    })
}

struct Tokens<'a> {
    inner: SplitWhitespace<'a>,
    line: usize,
}

impl<'a> Tokens<'a> {
    fn error(&self, message: String) -> TessellationError {
        TessellationError::Parse {
            line: self.line,
            message,
        }
    }

    fn next_token(&mut self, what: &str) -> Result<&'a str, TessellationError> {
        let line = self.line;
        self.inner.next().ok_or_else(|| TessellationError::Parse {
            line,
            message: format!("missing {what}"),
        })
    }

    fn next_parsed<T: std::str::FromStr>(&mut self, what: &str) -> Result<T, TessellationError> {
        let token = self.next_token(what)?;
        token
            .parse()
            .map_err(|_| self.error(format!("invalid {what} `{token}`")))
    }

    /// Parses a parenthesized, comma-separated tuple such as `(1,2,3)`.
    fn next_tuple<T: std::str::FromStr>(&mut self, what: &str) -> Result<Vec<T>, TessellationError> {
        let token = self.next_token(what)?;
        let inner = token
            .strip_prefix('(')
            .and_then(|t| t.strip_suffix(')'))
            .ok_or_else(|| self.error(format!("{what} `{token}` is not a tuple")))?;
        inner
            .split(',')
            .map(|v| v.parse::<T>())
            .collect::<Result<Vec<T>, _>>()
            .map_err(|_| self.error(format!("invalid {what} `{token}`")))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const TETRA: &str = "3 0.25 0.25 0.25 0.1666 1.5 4 (0,0,0) (1,0,0) (0,1,0) (0,0,1) \
                         4 (0,2,1) (0,1,3) (0,3,2) (1,2,3) -1 -3 -5 7";

    #[test]
    fn parses_custom_format_line() {
        let cell = parse_cell_line(TETRA, 1).unwrap();
        assert_eq!(cell.seed, 3);
        assert_relative_eq!(cell.position, Point3::new(0.25, 0.25, 0.25));
        assert_eq!(cell.vertices.len(), 4);
        assert_relative_eq!(cell.vertices[3], Point3::new(0.0, 0.0, 1.0));
        assert_eq!(cell.face_vertices[..4], [3, 0, 2, 1]);
        assert_eq!(cell.face_vertices.len(), 16);
        assert_eq!(cell.neighbors, vec![-1, -3, -5, 7]);
        assert_relative_eq!(cell.surface_area, 1.5);
    }

    #[test]
    fn reports_missing_neighbors() {
        let truncated = TETRA.trim_end_matches(" 7");
        let err = parse_cell_line(truncated, 9).unwrap_err();
        assert!(matches!(err, TessellationError::Parse { line: 9, .. }));
    }

    #[test]
    fn rejects_bad_tuples() {
        let line = "0 0 0 0 1 6 1 (0,0) 0";
        assert!(parse_cell_line(line, 1).is_err());
        let line = "0 0 0 0 1 6 1 0,0,0 0";
        assert!(parse_cell_line(line, 1).is_err());
    }

    #[test]
    fn rejects_trailing_tokens() {
        let line = format!("{TETRA} 8");
        assert!(parse_cell_line(&line, 1).is_err());
    }
}
