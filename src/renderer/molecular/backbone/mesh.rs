//! Tube mesh for one residue's window of a backbone extrusion.
//!
//! The mesh is a single triangle strip: start cap, body, end cap, with
//! degenerate joins between them and two repeated vertices at each end
//! so strips of neighbouring occupants concatenate inside one buffer.

use glam::Vec3;

use super::profile::{self, CrossSection};
use super::spline::{self, SplinePoint};
use super::Extrusion;
use crate::gpu::geometry_buffer::{BufferError, GeometryBuffer};
use crate::renderable::emit;

/// Vertices in one cross-section ring at `lod`. The last point repeats
/// the first.
#[must_use]
pub fn ring_points(lod: u32) -> u32 {
    2 * lod + 1
}

/// Vertices written for one residue at `lod`.
#[must_use]
pub fn tube_vertex_count(lod: u32) -> u32 {
    2 * ring_points(lod) * (lod + 2) + 8
}

/// How a residue's tube is shaped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct TubeShape {
    pub lod: u32,
    pub radius: f32,
    /// Widen by secondary structure.
    pub cartoon: bool,
}

/// Write the tube for local residue `local` of `extrusion`.
///
/// # Errors
///
/// [`BufferError::CapacityExceeded`] if the buffer runs out of room.
pub(crate) fn write_tube(
    buffer: &mut GeometryBuffer,
    extrusion: &Extrusion,
    local: usize,
    shape: TubeShape,
    colour: [u8; 4],
) -> Result<(), BufferError> {
    let lod = shape.lod.max(1);
    let points = ring_points(lod) as usize;
    let stations: Vec<(SplinePoint, CrossSection)> = (0..=lod)
        .map(|k| {
            let t = local as f32 + k as f32 / lod as f32;
            let frame = spline::frame_at(&extrusion.samples, t);
            let scale = if shape.cartoon {
                extrusion.scale_at(t)
            } else {
                1.0
            };
            let section = CrossSection {
                half_width: shape.radius * scale,
                half_thickness: shape.radius,
            };
            (frame, section)
        })
        .collect();
    let rings: Vec<Vec<(Vec3, Vec3)>> = stations
        .iter()
        .map(|(frame, section)| profile::ring(frame, *section, points).collect())
        .collect();

    let (first_frame, _) = stations[0];
    let (last_frame, _) = stations[stations.len() - 1];
    let first_ring = &rings[0];
    let last_ring = &rings[rings.len() - 1];
    let start_normal = -first_frame.tangent;
    let end_normal = last_frame.tangent;

    // Leading repeats
    for _ in 0..2 {
        emit(buffer, first_frame.pos, start_normal, colour)?;
    }

    // ── Start cap ──
    for &(pos, _) in first_ring {
        emit(buffer, first_frame.pos, start_normal, colour)?;
        emit(buffer, pos, start_normal, colour)?;
    }
    emit(buffer, first_ring[points - 1].0, start_normal, colour)?;
    emit(buffer, first_ring[0].0, first_ring[0].1, colour)?;

    // ── Body ──
    for pair in rings.windows(2) {
        for (&(a, na), &(b, nb)) in pair[0].iter().zip(&pair[1]) {
            emit(buffer, a, na, colour)?;
            emit(buffer, b, nb, colour)?;
        }
    }
    let (tail, tail_normal) = last_ring[points - 1];
    emit(buffer, tail, tail_normal, colour)?;
    emit(buffer, last_ring[0].0, end_normal, colour)?;

    // ── End cap ──
    for &(pos, _) in last_ring {
        emit(buffer, pos, end_normal, colour)?;
        emit(buffer, last_frame.pos, end_normal, colour)?;
    }

    // Trailing repeats
    for _ in 0..2 {
        emit(buffer, last_frame.pos, end_normal, colour)?;
    }
    Ok(())
}

/// Write `count` collapsed vertices at `at`. Stands in for a residue
/// whose path is missing so the occupancy is still filled exactly.
///
/// # Errors
///
/// [`BufferError::CapacityExceeded`] if the buffer runs out of room.
pub(crate) fn write_collapsed(
    buffer: &mut GeometryBuffer,
    at: Vec3,
    count: u32,
    colour: [u8; 4],
) -> Result<(), BufferError> {
    for _ in 0..count {
        emit(buffer, at, Vec3::Z, colour)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::vertex_format::VertexFormat;
    use crate::renderer::molecular::backbone::profile::regions;
    use crate::scene::SSType;

    fn straight(n: usize, kind: SSType) -> Extrusion {
        let controls: Vec<Vec3> = (0..n).map(|i| Vec3::X * 3.8 * i as f32).collect();
        Extrusion {
            samples: spline::sample_centreline(&controls),
            regions: regions(&vec![kind; n]),
        }
    }

    fn position(buffer: &GeometryBuffer, vertex: u32) -> Vec3 {
        let bytes = buffer.vertex_bytes(vertex..vertex + 1);
        let f = |i: usize| f32::from_le_bytes([bytes[i], bytes[i + 1], bytes[i + 2], bytes[i + 3]]);
        Vec3::new(f(0), f(4), f(8))
    }

    #[test]
    fn counts_match_the_formula() {
        assert_eq!(ring_points(10), 21);
        assert_eq!(tube_vertex_count(10), 2 * 21 * 12 + 8);
    }

    #[test]
    fn writes_exactly_vertex_count() {
        for lod in [1, 4, 10, 13] {
            let count = tube_vertex_count(lod);
            let mut buffer = GeometryBuffer::new(VertexFormat::default(), count);
            let shape = TubeShape {
                lod,
                radius: 0.15,
                cartoon: false,
            };
            write_tube(&mut buffer, &straight(3, SSType::Coil), 1, shape, [1; 4]).unwrap();
            assert_eq!(buffer.cursor(), count, "lod {lod}");
        }
    }

    #[test]
    fn window_spans_one_unit_of_path() {
        let lod = 10;
        let mut buffer = GeometryBuffer::new(VertexFormat::default(), tube_vertex_count(lod));
        let shape = TubeShape {
            lod,
            radius: 0.15,
            cartoon: false,
        };
        write_tube(&mut buffer, &straight(3, SSType::Coil), 1, shape, [1; 4]).unwrap();
        // caps are centred at the window ends: parameters 1 and 2
        assert!(position(&buffer, 0).distance(Vec3::X * 1.9) < 1e-3);
        let last = tube_vertex_count(lod) - 1;
        assert!(position(&buffer, last).distance(Vec3::X * 5.7) < 1e-3);
    }

    #[test]
    fn cartoon_helix_is_wider_than_trace() {
        let lod = 10;
        let extrusion = straight(5, SSType::Helix);
        let widest = |cartoon| {
            let mut buffer =
                GeometryBuffer::new(VertexFormat::default(), tube_vertex_count(lod));
            let shape = TubeShape {
                lod,
                radius: 0.15,
                cartoon,
            };
            write_tube(&mut buffer, &extrusion, 2, shape, [1; 4]).unwrap();
            (0..tube_vertex_count(lod))
                .map(|v| {
                    let p = position(&buffer, v);
                    Vec3::new(0.0, p.y, p.z).length()
                })
                .fold(0.0f32, f32::max)
        };
        assert!((widest(false) - 0.15).abs() < 1e-3);
        assert!((widest(true) - 1.5).abs() < 1e-2);
    }
}
