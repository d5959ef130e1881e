//! Spline math and frame computation for backbone centrelines.
//!
//! Pure Vec3 → Vec3 transforms with no buffer or registry dependencies.

use glam::Vec3;

/// Centreline samples per unit of path parameter. Fixed so frames do not
/// depend on the tessellation level.
pub(crate) const SAMPLES_PER_UNIT: usize = 16;

/// Framed centreline sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct SplinePoint {
    pub pos: Vec3,
    pub tangent: Vec3,
    pub normal: Vec3,
    pub binormal: Vec3,
}

/// Catmull-Rom through every control point, `segments_per_span` samples
/// per span.
pub(crate) fn catmull_rom(points: &[Vec3], segments_per_span: usize) -> Vec<Vec3> {
    let n = points.len();
    if n < 2 {
        return points.to_vec();
    }
    if n < 3 {
        return linear_interpolate(points, segments_per_span);
    }

    let mut result = Vec::with_capacity((n - 1) * segments_per_span + 1);

    for i in 0..n - 1 {
        let p0 = if i == 0 {
            points[0] * 2.0 - points[1]
        } else {
            points[i - 1]
        };
        let p1 = points[i];
        let p2 = points[i + 1];
        let p3 = if i + 2 >= n {
            points[n - 1] * 2.0 - points[n - 2]
        } else {
            points[i + 2]
        };

        for j in 0..segments_per_span {
            let t = j as f32 / segments_per_span as f32;
            let t2 = t * t;
            let t3 = t2 * t;

            let pos = 0.5
                * ((2.0 * p1)
                    + (-p0 + p2) * t
                    + (2.0 * p0 - 5.0 * p1 + 4.0 * p2 - p3) * t2
                    + (-p0 + 3.0 * p1 - 3.0 * p2 + p3) * t3);
            result.push(pos);
        }
    }

    result.push(points[n - 1]);
    result
}

/// Straight segments, for fewer than four control points.
pub(crate) fn linear_interpolate(points: &[Vec3], segments_per_span: usize) -> Vec<Vec3> {
    let mut result = Vec::new();
    for pair in points.windows(2) {
        for j in 0..segments_per_span {
            let t = j as f32 / segments_per_span as f32;
            result.push(pair[0].lerp(pair[1], t));
        }
    }
    if let Some(&last) = points.last() {
        result.push(last);
    }
    result
}

/// Replace each interior point with `((prev + next) / 2 + p) / 2`.
pub(crate) fn smooth(points: &[Vec3]) -> Vec<Vec3> {
    let n = points.len();
    (0..n)
        .map(|i| {
            if i == 0 || i + 1 == n {
                points[i]
            } else {
                ((points[i - 1] + points[i + 1]) * 0.5 + points[i]) * 0.5
            }
        })
        .collect()
}

/// Sample a centreline through `controls`, with control point `k` at
/// parameter `k + 0.5` and the path extended linearly by half a unit past
/// each end. Returns `controls.len() * SAMPLES_PER_UNIT + 1` framed
/// samples; sample `s` sits at parameter `s / SAMPLES_PER_UNIT`.
pub(crate) fn sample_centreline(controls: &[Vec3]) -> Vec<SplinePoint> {
    let n = controls.len();
    if n == 0 {
        return Vec::new();
    }
    let half = SAMPLES_PER_UNIT / 2;
    let (head_dir, tail_dir) = if n < 2 {
        (Vec3::ZERO, Vec3::ZERO)
    } else {
        (controls[1] - controls[0], controls[n - 1] - controls[n - 2])
    };

    let mut positions = Vec::with_capacity(n * SAMPLES_PER_UNIT + 1);
    for s in 0..half {
        let u = (s as f32 - half as f32) / SAMPLES_PER_UNIT as f32;
        positions.push(controls[0] + head_dir * u);
    }
    positions.extend(catmull_rom(controls, SAMPLES_PER_UNIT));
    for s in 1..=half {
        let u = s as f32 / SAMPLES_PER_UNIT as f32;
        positions.push(controls[n - 1] + tail_dir * u);
    }

    let mut points: Vec<SplinePoint> = positions
        .iter()
        .map(|&pos| SplinePoint {
            pos,
            tangent: Vec3::X,
            normal: Vec3::Y,
            binormal: Vec3::Z,
        })
        .collect();
    compute_tangents(&mut points);
    compute_rmf(&mut points);
    points
}

/// Central-difference tangents. Degenerate stretches inherit the
/// previous tangent.
fn compute_tangents(points: &mut [SplinePoint]) {
    let n = points.len();
    let mut previous = Vec3::X;
    for i in 0..n {
        let ahead = points[(i + 1).min(n - 1)].pos;
        let behind = points[i.saturating_sub(1)].pos;
        let tangent = (ahead - behind).try_normalize().unwrap_or(previous);
        points[i].tangent = tangent;
        previous = tangent;
    }
}

/// Propagate normals and binormals along the samples by double
/// reflection, so the tube does not twist between residues.
pub(crate) fn compute_rmf(points: &mut [SplinePoint]) {
    if points.is_empty() {
        return;
    }

    let t0 = points[0].tangent;
    let arbitrary = if t0.x.abs() < 0.9 { Vec3::X } else { Vec3::Y };
    let n0 = t0.cross(arbitrary).normalize();
    let b0 = t0.cross(n0).normalize();

    points[0].normal = n0;
    points[0].binormal = b0;

    for i in 0..points.len() - 1 {
        let x_i = points[i].pos;
        let x_i1 = points[i + 1].pos;
        let t_i = points[i].tangent;
        let t_i1 = points[i + 1].tangent;
        let r_i = points[i].normal;

        let v1 = x_i1 - x_i;
        let c1 = v1.dot(v1);

        if c1 < 1e-10 {
            points[i + 1].normal = r_i;
            points[i + 1].binormal = points[i].binormal;
            continue;
        }

        // First reflection
        let r_i_l = r_i - (2.0 / c1) * v1.dot(r_i) * v1;
        let t_i_l = t_i - (2.0 / c1) * v1.dot(t_i) * v1;

        // Second reflection
        let v2 = t_i1 - t_i_l;
        let c2 = v2.dot(v2);

        let r_i1 = if c2 < 1e-10 {
            r_i_l
        } else {
            r_i_l - (2.0 / c2) * v2.dot(r_i_l) * v2
        };

        // Ensure orthonormality
        let r_i1 = (r_i1 - t_i1 * t_i1.dot(r_i1)).normalize();
        let s_i1 = t_i1.cross(r_i1).normalize();

        points[i + 1].normal = r_i1;
        points[i + 1].binormal = s_i1;
    }
}

/// Frame at parameter `t`, linearly blended between the two nearest
/// samples and re-orthonormalized.
pub(crate) fn frame_at(samples: &[SplinePoint], t: f32) -> SplinePoint {
    let Some(last) = samples.len().checked_sub(1) else {
        return SplinePoint {
            pos: Vec3::ZERO,
            tangent: Vec3::X,
            normal: Vec3::Y,
            binormal: Vec3::Z,
        };
    };
    let x = (t * SAMPLES_PER_UNIT as f32).clamp(0.0, last as f32);
    let i = (x.floor() as usize).min(last);
    let j = (i + 1).min(last);
    let f = x - i as f32;
    let (a, b) = (samples[i], samples[j]);

    let tangent = a.tangent.lerp(b.tangent, f).try_normalize().unwrap_or(a.tangent);
    let normal = a.normal.lerp(b.normal, f);
    let normal = (normal - tangent * tangent.dot(normal))
        .try_normalize()
        .unwrap_or(a.normal);
    SplinePoint {
        pos: a.pos.lerp(b.pos, f),
        tangent,
        normal,
        binormal: tangent.cross(normal),
    }
}
