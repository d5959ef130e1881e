//! Backbone centrelines for chains.
//!
//! A chain's Cα trace is cut into independent extrusions wherever
//! consecutive residues are not bonded, each extrusion is optionally
//! smoothed, then sampled into rotation-minimising frames. Residues map
//! to a one-unit parameter window of their extrusion.

pub(crate) mod mesh;
pub(crate) mod profile;
pub(crate) mod spline;

use glam::Vec3;

use self::profile::SsRegion;
use self::spline::SplinePoint;
use crate::scene::ResidueRecord;

/// Distances used to decide where a backbone is broken.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BreakThresholds {
    /// Maximum C(i-1)–N(i) distance.
    pub peptide: f32,
    /// Maximum Cα–Cα distance, used when C or N is missing.
    pub trace: f32,
}

impl BreakThresholds {
    /// Whether the backbone is continuous from `prev` to `next`.
    #[must_use]
    pub fn bonded(&self, prev: &ResidueRecord, next: &ResidueRecord) -> bool {
        match (prev.c, next.n, prev.ca, next.ca) {
            (Some(c), Some(n), _, _) => c.distance(n) <= self.peptide,
            (_, _, Some(a), Some(b)) => a.distance(b) <= self.trace,
            _ => false,
        }
    }
}

/// One independently interpolated stretch of backbone.
#[derive(Debug, Clone)]
pub(crate) struct Extrusion {
    pub samples: Vec<SplinePoint>,
    pub regions: Vec<SsRegion>,
}

impl Extrusion {
    /// Width multiplier at parameter `t`.
    pub fn scale_at(&self, t: f32) -> f32 {
        self.regions
            .iter()
            .find(|region| t <= region.end)
            .or_else(|| self.regions.last())
            .map_or(1.0, |region| region.scale_at(t))
    }
}

/// Where one residue sits on its chain's path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ResidueSpan {
    pub extrusion: usize,
    pub local: usize,
}

/// Sampled centreline of a whole chain.
#[derive(Debug, Clone, Default)]
pub struct ExtrusionPath {
    extrusions: Vec<Extrusion>,
    spans: Vec<Option<ResidueSpan>>,
}

impl ExtrusionPath {
    /// Path through the Cα atoms of `residues`. Residues without a Cα are
    /// skipped and do not break the path by themselves.
    #[must_use]
    pub fn build(residues: &[ResidueRecord], smooth: bool, thresholds: BreakThresholds) -> Self {
        let mut spans = vec![None; residues.len()];
        let mut groups: Vec<Vec<usize>> = Vec::new();
        let mut previous: Option<usize> = None;

        for (i, residue) in residues.iter().enumerate() {
            if residue.ca.is_none() {
                continue;
            }
            let continues = previous.is_some_and(|p| thresholds.bonded(&residues[p], residue));
            match groups.last_mut() {
                Some(group) if continues => group.push(i),
                _ => groups.push(vec![i]),
            }
            previous = Some(i);
        }

        let extrusions = groups
            .iter()
            .enumerate()
            .map(|(e, group)| {
                for (local, &i) in group.iter().enumerate() {
                    spans[i] = Some(ResidueSpan {
                        extrusion: e,
                        local,
                    });
                }
                let controls: Vec<Vec3> =
                    group.iter().filter_map(|&i| residues[i].ca).collect();
                let controls = if smooth {
                    spline::smooth(&controls)
                } else {
                    controls
                };
                let kinds: Vec<_> = group.iter().map(|&i| residues[i].ss).collect();
                Extrusion {
                    samples: spline::sample_centreline(&controls),
                    regions: profile::regions(&kinds),
                }
            })
            .collect();

        Self { extrusions, spans }
    }

    /// Number of independent extrusions.
    #[must_use]
    pub fn extrusion_count(&self) -> usize {
        self.extrusions.len()
    }

    /// Extrusion and local index of residue `index` of the chain.
    pub(crate) fn span(&self, index: usize) -> Option<(&Extrusion, usize)> {
        let span = (*self.spans.get(index)?)?;
        Some((self.extrusions.get(span.extrusion)?, span.local))
    }

    /// Extrusion index of residue `index`, if it has a Cα.
    #[must_use]
    pub fn extrusion_of(&self, index: usize) -> Option<usize> {
        self.spans.get(index).copied().flatten().map(|s| s.extrusion)
    }

    /// Centre of residue `index`'s window.
    #[must_use]
    pub fn centre_of(&self, index: usize) -> Option<Vec3> {
        let (extrusion, local) = self.span(index)?;
        Some(spline::frame_at(&extrusion.samples, local as f32 + 0.5).pos)
    }
}
