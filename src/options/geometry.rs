use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Lowest atom tessellation level.
pub const MIN_ATOM_LOD: u32 = 4;
/// Lowest backbone tessellation level.
pub const MIN_CHAIN_LOD: u32 = 10;
/// Highest atom tessellation level. Keeps sphere vertex counts well
/// inside `u32`.
pub const MAX_ATOM_LOD: u32 = 64;
/// Highest backbone tessellation level.
pub const MAX_CHAIN_LOD: u32 = 64;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(default)]
/// Tessellation and backbone geometry options.
pub struct GeometryOptions {
    /// Initial atom level of detail (sphere mesh rings).
    pub atom_lod: u32,
    /// Initial backbone level of detail (spans per residue).
    pub chain_lod: u32,
    /// Backbone tube radius in angstroms.
    pub tube_radius: f32,
    /// Radius multiplier for chunky backbone traces.
    pub chunky_scale: f32,
    /// Atom radius multiplier in balls-and-sticks mode.
    pub ball_and_stick_scale: f32,
    /// Maximum C(i-1)–N(i) distance before the backbone is split.
    pub peptide_separation: f32,
    /// Maximum Cα–Cα distance before the backbone is split, used when
    /// carbonyl or amide atoms are missing.
    pub trace_separation: f32,
}

impl Default for GeometryOptions {
    fn default() -> Self {
        Self {
            atom_lod: MIN_ATOM_LOD,
            chain_lod: MIN_CHAIN_LOD,
            tube_radius: 0.15,
            chunky_scale: 6.0,
            ball_and_stick_scale: 0.25,
            peptide_separation: 3.4,
            trace_separation: 4.2,
        }
    }
}
