use glam::Vec3;

/// Bounding sphere used to frame a scene.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneBounds {
    /// Centroid of the points.
    pub centre: Vec3,
    /// Radius enclosing every point plus a 2 Å margin.
    pub radius: f32,
}

impl SceneBounds {
    /// Bounds of `points`. `None` for an empty set.
    ///
    /// The radius is half the box diagonal plus the distance from the
    /// box centre to the centroid, plus the margin.
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Option<Self> {
        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);
        let mut sum = Vec3::ZERO;
        let mut count = 0u32;
        for p in points {
            min = min.min(p);
            max = max.max(p);
            sum += p;
            count += 1;
        }
        if count == 0 {
            return None;
        }
        let centre = sum / count as f32;
        let longest_diagonal = (max - min).length();
        let centre_offset = ((max + min) * 0.5 - centre).length();
        Some(Self {
            centre,
            radius: longest_diagonal / 2.0 + centre_offset + 2.0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symmetric_points_centre_on_box() {
        let bounds =
            SceneBounds::from_points([Vec3::new(-1.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0)])
                .unwrap();
        assert_eq!(bounds.centre, Vec3::ZERO);
        assert!((bounds.radius - 3.0).abs() < 1e-6);
    }

    #[test]
    fn skewed_points_add_centre_offset() {
        let bounds = SceneBounds::from_points([
            Vec3::ZERO,
            Vec3::ZERO,
            Vec3::ZERO,
            Vec3::new(4.0, 0.0, 0.0),
        ])
        .unwrap();
        assert_eq!(bounds.centre, Vec3::new(1.0, 0.0, 0.0));
        // diagonal 4 → 2, offset |2 - 1| = 1, margin 2
        assert!((bounds.radius - 5.0).abs() < 1e-6);
    }

    #[test]
    fn empty_has_no_bounds() {
        assert!(SceneBounds::from_points(std::iter::empty()).is_none());
    }
}
