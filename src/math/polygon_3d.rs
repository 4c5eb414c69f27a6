use super::{Point3, Vector3};

/// Area vector of a closed polygon using Newell's method.
///
/// The direction follows the winding of `points` (right-hand rule) and the
/// length equals twice the polygon area. Works for non-planar input by
/// returning the area of the best-fit projection.
#[must_use]
pub fn newell_vector(points: &[Point3]) -> Vector3 {
    let n = points.len();
    let mut normal = Vector3::new(0.0, 0.0, 0.0);
    for i in 0..n {
        let curr = &points[i];
        let next = &points[(i + 1) % n];
        normal.x += (curr.y - next.y) * (curr.z + next.z);
        normal.y += (curr.z - next.z) * (curr.x + next.x);
        normal.z += (curr.x - next.x) * (curr.y + next.y);
    }
    normal
}

/// Area of a closed planar polygon in 3D.
#[must_use]
pub fn polygon_area_3d(points: &[Point3]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    0.5 * newell_vector(points).norm()
}

/// Volume enclosed by a closed polyhedron given as a set of planar faces.
///
/// Uses the divergence theorem: each face contributes
/// `(1/3) * c . A` where `c` is any point on the face plane and `A` the face
/// area vector. Faces must be consistently oriented (all outward or all
/// inward); the absolute value is returned.
#[must_use]
pub fn polyhedron_volume<'a, I>(faces: I) -> f64
where
    I: IntoIterator<Item = &'a [Point3]>,
{
    let mut signed = 0.0;
    for face in faces {
        if face.len() < 3 {
            continue;
        }
        let area = newell_vector(face) * 0.5;
        signed += face[0].coords.dot(&area);
    }
    (signed / 3.0).abs()
}
