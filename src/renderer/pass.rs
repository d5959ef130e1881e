//! Render passes, pass tags and per-pass pipeline configuration.
//!
//! Every frame runs the fixed [`FRAME_SEQUENCE`]; [`RenderPass::Pick`] runs
//! on demand. Each pass carries a [`PassState`] (depth, stencil, blend,
//! colour-mask and lighting switches) and a [`PassDispatch`] describing
//! which occupants it draws and whether it batches them.

use std::fmt;

/// Classification deciding which passes draw an occupant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum RenderTag {
    /// Opaque geometry.
    #[default]
    Solid,
    /// Blended geometry resolved against a depth prepass.
    Shade,
    /// Transparent geometry resolved against a depth prepass.
    Transparent,
    /// Opaque geometry that also gets a stencil outline.
    Outline,
}

/// One render pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderPass {
    /// Stencil silhouette for shadows (only when shadows are enabled).
    Shadow,
    /// Stencil silhouette of outlined occupants.
    Stencil,
    /// Opaque lit geometry.
    Draw,
    /// Depth prepass for shaded geometry.
    DepthShaded,
    /// Blended shaded geometry at equal depth.
    DrawShaded,
    /// Depth prepass for transparent geometry.
    DepthTransparent,
    /// Blended transparent geometry at equal depth.
    DrawTransparent,
    /// Wireframe outline outside the stencil silhouette.
    DrawOutline,
    /// Object names into the pick target.
    Pick,
}

/// Passes run every frame, in order.
pub const FRAME_SEQUENCE: [RenderPass; 8] = [
    RenderPass::Shadow,
    RenderPass::Stencil,
    RenderPass::Draw,
    RenderPass::DepthShaded,
    RenderPass::DrawShaded,
    RenderPass::DepthTransparent,
    RenderPass::DrawTransparent,
    RenderPass::DrawOutline,
];

/// How a pass selects and groups its draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassDispatch {
    /// One draw per occupant carrying one of `tags`.
    PerObject {
        /// Eligible tags.
        tags: &'static [RenderTag],
        /// Attach the occupant's pick name.
        named: bool,
        /// Replace vertex colours with the occupant's highlight colour.
        highlight: bool,
    },
    /// One draw per buffer in every bucket tagged with one of `tags`.
    Batched {
        /// Eligible tags.
        tags: &'static [RenderTag],
    },
}

impl PassDispatch {
    /// Tags this dispatch accepts.
    #[must_use]
    pub fn tags(&self) -> &'static [RenderTag] {
        match self {
            Self::PerObject { tags, .. } | Self::Batched { tags } => *tags,
        }
    }

    /// Whether occupants tagged `tag` are drawn.
    #[must_use]
    pub fn accepts(&self, tag: RenderTag) -> bool {
        self.tags().contains(&tag)
    }
}

impl RenderPass {
    /// Draw selection rule for this pass.
    #[must_use]
    pub fn dispatch(self) -> PassDispatch {
        use RenderTag::{Outline, Shade, Solid, Transparent};
        match self {
            Self::Shadow | Self::Stencil => PassDispatch::PerObject {
                tags: &[Outline],
                named: false,
                highlight: false,
            },
            Self::DrawOutline => PassDispatch::PerObject {
                tags: &[Outline],
                named: false,
                highlight: true,
            },
            Self::Pick => PassDispatch::PerObject {
                tags: &[Solid, Outline],
                named: true,
                highlight: false,
            },
            Self::Draw => PassDispatch::Batched {
                tags: &[Solid, Outline],
            },
            Self::DepthShaded | Self::DrawShaded => PassDispatch::Batched {
                tags: &[Shade, Outline],
            },
            Self::DepthTransparent | Self::DrawTransparent => {
                PassDispatch::Batched {
                    tags: &[Transparent, Outline],
                }
            }
        }
    }

    /// Pipeline configuration for this pass.
    #[must_use]
    pub fn state(self, specular: bool) -> PassState {
        let silhouette = PassState {
            depth: DepthMode::Disabled,
            stencil: StencilMode::WriteOne,
            blend: false,
            colour_write: false,
            lighting: false,
            specular: false,
            polygon: PolygonMode::Fill,
            target: PassTarget::Colour,
        };
        let prepass = PassState {
            depth: DepthMode::Test {
                compare: DepthCompare::LessEqual,
                write: true,
            },
            stencil: StencilMode::Disabled,
            ..silhouette
        };
        match self {
            Self::Shadow | Self::Stencil => silhouette,
            Self::DepthShaded | Self::DepthTransparent => prepass,
            Self::DrawShaded | Self::DrawTransparent => PassState {
                depth: DepthMode::Test {
                    compare: DepthCompare::Equal,
                    write: true,
                },
                blend: true,
                colour_write: true,
                lighting: true,
                ..prepass
            },
            Self::Draw => PassState {
                colour_write: true,
                lighting: true,
                specular,
                ..prepass
            },
            Self::DrawOutline => PassState {
                stencil: StencilMode::NotEqualOne,
                colour_write: true,
                polygon: PolygonMode::Line { width: 5.0 },
                ..silhouette
            },
            Self::Pick => PassState {
                colour_write: true,
                target: PassTarget::Pick,
                ..prepass
            },
        }
    }

    /// Position in [`FRAME_SEQUENCE`], `None` for on-demand passes.
    #[must_use]
    pub fn frame_index(self) -> Option<usize> {
        FRAME_SEQUENCE.iter().position(|&pass| pass == self)
    }
}

impl fmt::Display for RenderPass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Shadow => "shadow",
            Self::Stencil => "stencil",
            Self::Draw => "draw",
            Self::DepthShaded => "depth-shaded",
            Self::DrawShaded => "draw-shaded",
            Self::DepthTransparent => "depth-transparent",
            Self::DrawTransparent => "draw-transparent",
            Self::DrawOutline => "draw-outline",
            Self::Pick => "pick",
        };
        f.write_str(name)
    }
}

/// Depth comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DepthCompare {
    /// Pass when nearer or equal.
    LessEqual,
    /// Pass only at exactly the stored depth.
    Equal,
}

/// Depth test configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DepthMode {
    /// No depth test and no depth writes.
    Disabled,
    /// Depth test with the given comparison.
    Test {
        /// Comparison function.
        compare: DepthCompare,
        /// Write passing depths.
        write: bool,
    },
}

/// Stencil configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StencilMode {
    /// Stencil unused.
    Disabled,
    /// Always pass and replace with 1.
    WriteOne,
    /// Pass where the stencil is not 1; keep values.
    NotEqualOne,
}

/// Rasterization fill.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PolygonMode {
    /// Filled triangles.
    Fill,
    /// Triangle edges only.
    Line {
        /// Requested line width in pixels.
        width: f32,
    },
}

/// Attachment a pass renders into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PassTarget {
    /// The colour target.
    Colour,
    /// The integer pick target.
    Pick,
}

/// Fixed pipeline configuration of one pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PassState {
    /// Depth test.
    pub depth: DepthMode,
    /// Stencil test and operation.
    pub stencil: StencilMode,
    /// Source-alpha blending.
    pub blend: bool,
    /// Colour channel writes.
    pub colour_write: bool,
    /// Lit shading.
    pub lighting: bool,
    /// Specular term in lit shading.
    pub specular: bool,
    /// Fill mode.
    pub polygon: PolygonMode,
    /// Attachment written.
    pub target: PassTarget,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_sequence_order() {
        assert_eq!(FRAME_SEQUENCE[0], RenderPass::Shadow);
        assert_eq!(FRAME_SEQUENCE[7], RenderPass::DrawOutline);
        assert_eq!(RenderPass::Draw.frame_index(), Some(2));
        assert_eq!(RenderPass::Pick.frame_index(), None);
    }

    #[test]
    fn transparent_passes_take_transparent_and_outline() {
        for pass in [RenderPass::DepthTransparent, RenderPass::DrawTransparent] {
            let dispatch = pass.dispatch();
            assert!(dispatch.accepts(RenderTag::Transparent));
            assert!(dispatch.accepts(RenderTag::Outline));
            assert!(!dispatch.accepts(RenderTag::Solid));
            assert!(!dispatch.accepts(RenderTag::Shade));
        }
    }

    #[test]
    fn outline_passes_draw_per_object() {
        for pass in [RenderPass::Shadow, RenderPass::Stencil, RenderPass::DrawOutline] {
            assert!(matches!(
                pass.dispatch(),
                PassDispatch::PerObject { tags: &[RenderTag::Outline], .. }
            ));
        }
        assert!(matches!(
            RenderPass::Pick.dispatch(),
            PassDispatch::PerObject { named: true, .. }
        ));
    }

    #[test]
    fn blended_passes_test_equal_depth() {
        let state = RenderPass::DrawShaded.state(true);
        assert!(state.blend);
        assert_eq!(
            state.depth,
            DepthMode::Test {
                compare: DepthCompare::Equal,
                write: true
            }
        );
        assert!(!state.specular);
    }

    #[test]
    fn specular_only_in_draw_pass() {
        assert!(RenderPass::Draw.state(true).specular);
        assert!(!RenderPass::Draw.state(false).specular);
        assert!(!RenderPass::DrawTransparent.state(true).specular);
    }

    #[test]
    fn silhouette_and_outline_use_stencil() {
        let stencil = RenderPass::Stencil.state(true);
        assert_eq!(stencil.stencil, StencilMode::WriteOne);
        assert!(!stencil.colour_write);
        assert_eq!(stencil.depth, DepthMode::Disabled);
        let outline = RenderPass::DrawOutline.state(true);
        assert_eq!(outline.stencil, StencilMode::NotEqualOne);
        assert_eq!(outline.polygon, PolygonMode::Line { width: 5.0 });
    }

    #[test]
    fn prepasses_write_depth_without_colour() {
        let state = RenderPass::DepthShaded.state(true);
        assert!(!state.colour_write);
        assert_eq!(state.stencil, StencilMode::Disabled);
        assert_eq!(RenderPass::Pick.state(true).target, PassTarget::Pick);
    }
}
