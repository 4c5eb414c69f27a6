use crate::error::CellError;

/// Decodes a count-prefixed face adjacency list into one index list per face.
///
/// `flat` holds, for every face, the vertex count followed by that many
/// local vertex indices, e.g. `[3, 0, 1, 2, 4, 0, 2, 3, 5]` decodes to
/// `[[0, 1, 2], [0, 2, 3, 5]]`.
///
/// # Errors
///
/// Returns [`CellError::MalformedAdjacency`] if a count runs past the end of
/// the list.
pub fn decode_face_vertices(seed: usize, flat: &[usize]) -> Result<Vec<Vec<usize>>, CellError> {
    let mut faces = Vec::new();
    let mut rest = flat;
    while let Some((&count, tail)) = rest.split_first() {
        if count > tail.len() {
            return Err(CellError::MalformedAdjacency {
                seed,
                message: format!(
                    "face {} declares {count} vertices but only {} entries remain",
                    faces.len(),
                    tail.len()
                ),
            });
        }
        let (face, next) = tail.split_at(count);
        faces.push(face.to_vec());
        rest = next;
    }
    Ok(faces)
}
