//! Cross-section profiles and extrusion for backbone geometry.
//!
//! Maps secondary structure regions to a width scale along the path and
//! extrudes closed cross-section rings at spline frames.

use std::f32::consts::{PI, TAU};

use glam::Vec3;

use super::spline::SplinePoint;
use crate::scene::SSType;

/// Width multiplier reached inside helix and sheet regions.
pub(crate) const REGION_SCALE: f32 = 10.0;
/// Parameter length of the cosine taper at each end of a sheet.
pub(crate) const SHEET_TAPER: f32 = 0.4;
/// Parameter length of the cosine taper at each end of a helix.
pub(crate) const HELIX_TAPER: f32 = 0.8;

// ==================== SHAPE SCALING ====================

/// A run of residues sharing one secondary structure, as a path
/// parameter range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct SsRegion {
    pub kind: SSType,
    pub start: f32,
    pub end: f32,
}

impl SsRegion {
    /// Width multiplier at path parameter `t`.
    pub fn scale_at(&self, t: f32) -> f32 {
        let taper = match self.kind {
            SSType::Coil => return 1.0,
            SSType::Helix => HELIX_TAPER,
            SSType::Sheet => SHEET_TAPER,
        };
        let depth = (t - self.start).min(self.end - t).max(0.0);
        if depth >= taper {
            return REGION_SCALE;
        }
        let blend = (1.0 - (PI * depth / taper).cos()) * 0.5;
        1.0 + (REGION_SCALE - 1.0) * blend
    }
}

/// Group consecutive residues with equal secondary structure. Residue
/// `k` spans parameters `k..k + 1`.
pub(crate) fn regions(kinds: &[SSType]) -> Vec<SsRegion> {
    let mut out: Vec<SsRegion> = Vec::new();
    for (k, &kind) in kinds.iter().enumerate() {
        let start = k as f32;
        match out.last_mut() {
            Some(region) if region.kind == kind => region.end = start + 1.0,
            _ => out.push(SsRegion {
                kind,
                start,
                end: start + 1.0,
            }),
        }
    }
    out
}

// ==================== CROSS-SECTION EXTRUSION ====================

/// Elliptical cross-section half extents.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct CrossSection {
    /// Half extent along the frame binormal.
    pub half_width: f32,
    /// Half extent along the frame normal.
    pub half_thickness: f32,
}

/// Closed ring of `points` vertices at `frame`: the last point repeats
/// the first so consecutive rings stitch into one strip.
pub(crate) fn ring(
    frame: &SplinePoint,
    section: CrossSection,
    points: usize,
) -> impl Iterator<Item = (Vec3, Vec3)> + '_ {
    let intervals = points.saturating_sub(1).max(1);
    (0..points).map(move |k| {
        let angle = (k % intervals) as f32 / intervals as f32 * TAU;
        let (sin_a, cos_a) = angle.sin_cos();
        let offset = frame.binormal * (cos_a * section.half_width)
            + frame.normal * (sin_a * section.half_thickness);
        // Ellipse normal: gradient of (x/a)² + (y/b)²
        let normal = (frame.binormal * (cos_a / section.half_width.max(f32::EPSILON))
            + frame.normal * (sin_a / section.half_thickness.max(f32::EPSILON)))
        .normalize_or_zero();
        (frame.pos + offset, normal)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> SplinePoint {
        SplinePoint {
            pos: Vec3::ZERO,
            tangent: Vec3::Z,
            normal: Vec3::Y,
            binormal: Vec3::X,
        }
    }

    #[test]
    fn coil_never_scales() {
        let region = SsRegion {
            kind: SSType::Coil,
            start: 0.0,
            end: 5.0,
        };
        assert_eq!(region.scale_at(2.5), 1.0);
    }

    #[test]
    fn helix_tapers_over_its_ends() {
        let region = SsRegion {
            kind: SSType::Helix,
            start: 2.0,
            end: 8.0,
        };
        assert!((region.scale_at(2.0) - 1.0).abs() < 1e-6);
        assert!((region.scale_at(2.4) - 5.5).abs() < 1e-4);
        assert_eq!(region.scale_at(5.0), REGION_SCALE);
        assert!((region.scale_at(8.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn sheet_taper_is_shorter() {
        let sheet = SsRegion {
            kind: SSType::Sheet,
            start: 0.0,
            end: 4.0,
        };
        assert_eq!(sheet.scale_at(0.4), REGION_SCALE);
    }

    #[test]
    fn regions_merge_runs() {
        use SSType::{Coil, Helix, Sheet};
        let found = regions(&[Coil, Helix, Helix, Helix, Sheet, Sheet]);
        assert_eq!(found.len(), 3);
        assert_eq!((found[1].start, found[1].end), (1.0, 4.0));
        assert_eq!(found[2].kind, Sheet);
    }

    #[test]
    fn ring_closes_on_itself() {
        let section = CrossSection {
            half_width: 2.0,
            half_thickness: 1.0,
        };
        let points: Vec<_> = ring(&frame(), section, 9).collect();
        assert_eq!(points.len(), 9);
        assert_eq!(points[0], points[8]);
        assert!(points[0].0.distance(Vec3::X * 2.0) < 1e-6);
        assert!(points[2].0.distance(Vec3::Y) < 1e-5);
        assert!(points[2].1.distance(Vec3::Y) < 1e-5);
    }
}
