use std::io::{self, Write};

use super::ConsolidatedMesh;

/// Writes `mesh` in the POLY format.
///
/// Points are listed as `id:\tx y z` with twelve decimals. Faces follow in
/// descending id order, each with its vertex ids reversed and tagged with
/// its particle as `< c(0, 0, 0, particle)`.
///
/// # Errors
///
/// Propagates write failures.
pub fn write_poly<W: Write>(out: &mut W, mesh: &ConsolidatedMesh) -> io::Result<()> {
    writeln!(out, "POINTS")?;
    for (index, p) in mesh.points.iter().enumerate() {
        writeln!(out, "{}:\t{:.12} {:.12} {:.12}", index + 1, p.x, p.y, p.z)?;
    }
    writeln!(out, "POLYS")?;
    for face in mesh.faces.iter().rev() {
        write!(out, "{}:\t", face.id)?;
        for v in face.vertices.iter().rev() {
            write!(out, "{v} ")?;
        }
        writeln!(out, "< c(0, 0, 0, {})", face.owner)?;
    }
    writeln!(out, "END")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Point3;
    use crate::merge::Neighbor;
    use crate::mesh::MeshFace;
    use crate::points::ParticleId;

    #[test]
    fn writes_points_and_reversed_faces() {
        let mesh = ConsolidatedMesh {
            points: vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
                Point3::new(0.0, 0.0, -1.5),
            ],
            faces: vec![
                MeshFace {
                    id: 1,
                    vertices: vec![1, 2, 3],
                    owner: ParticleId::new(1),
                    neighbor: Neighbor::Wall(-5),
                },
                MeshFace {
                    id: 3,
                    vertices: vec![1, 3, 4],
                    owner: ParticleId::new(2),
                    neighbor: Neighbor::Particle(ParticleId::new(1)),
                },
            ],
            particles: vec![ParticleId::new(1), ParticleId::new(2)],
        };
        let mut out = Vec::new();
        write_poly(&mut out, &mesh).unwrap();
        let expected = "POINTS\n\
                        1:\t0.000000000000 0.000000000000 0.000000000000\n\
                        2:\t1.000000000000 0.000000000000 0.000000000000\n\
                        3:\t0.000000000000 1.000000000000 0.000000000000\n\
                        4:\t0.000000000000 0.000000000000 -1.500000000000\n\
                        POLYS\n\
                        3:\t4 3 1 < c(0, 0, 0, 2)\n\
                        1:\t3 2 1 < c(0, 0, 0, 1)\n\
                        END\n";
        assert_eq!(String::from_utf8(out).unwrap(), expected);
    }

    #[test]
    fn empty_mesh_has_empty_sections() {
        let mut out = Vec::new();
        write_poly(&mut out, &ConsolidatedMesh::default()).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "POINTS\nPOLYS\nEND\n");
    }
}
