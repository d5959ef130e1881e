//! Mapping from [`PassState`] to wgpu pipeline state.

use super::pass::{DepthCompare, DepthMode, PassState, PassTarget, PolygonMode, StencilMode};
use crate::gpu::geometry_buffer::PrimitiveMode;

/// Depth-stencil attachment format shared by every pass.
pub const DEPTH_STENCIL_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24PlusStencil8;

/// Pick target format: one object name per pixel.
pub const PICK_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::R32Uint;

/// Stencil reference value the silhouette passes write and the outline
/// pass tests against.
pub const STENCIL_REFERENCE: u32 = 1;

fn stencil_face(mode: StencilMode) -> wgpu::StencilFaceState {
    match mode {
        StencilMode::Disabled => wgpu::StencilFaceState::IGNORE,
        StencilMode::WriteOne => wgpu::StencilFaceState {
            compare: wgpu::CompareFunction::Always,
            fail_op: wgpu::StencilOperation::Keep,
            depth_fail_op: wgpu::StencilOperation::Replace,
            pass_op: wgpu::StencilOperation::Replace,
        },
        StencilMode::NotEqualOne => wgpu::StencilFaceState {
            compare: wgpu::CompareFunction::NotEqual,
            fail_op: wgpu::StencilOperation::Keep,
            depth_fail_op: wgpu::StencilOperation::Keep,
            pass_op: wgpu::StencilOperation::Keep,
        },
    }
}

/// Depth-stencil state for a pass.
#[must_use]
pub fn depth_stencil_state(state: &PassState) -> wgpu::DepthStencilState {
    let (depth_write_enabled, depth_compare) = match state.depth {
        DepthMode::Disabled => (false, wgpu::CompareFunction::Always),
        DepthMode::Test { compare, write } => (
            write,
            match compare {
                DepthCompare::LessEqual => wgpu::CompareFunction::LessEqual,
                DepthCompare::Equal => wgpu::CompareFunction::Equal,
            },
        ),
    };
    let face = stencil_face(state.stencil);
    let write_mask = if state.stencil == StencilMode::WriteOne {
        0xff
    } else {
        0
    };
    wgpu::DepthStencilState {
        format: DEPTH_STENCIL_FORMAT,
        depth_write_enabled,
        depth_compare,
        stencil: wgpu::StencilState {
            front: face,
            back: face,
            read_mask: 0xff,
            write_mask,
        },
        bias: wgpu::DepthBiasState::default(),
    }
}

/// Colour target for a pass. `colour_format` is used unless the pass
/// writes the pick target.
#[must_use]
pub fn colour_target(state: &PassState, colour_format: wgpu::TextureFormat) -> wgpu::ColorTargetState {
    let write_mask = if state.colour_write {
        wgpu::ColorWrites::ALL
    } else {
        wgpu::ColorWrites::empty()
    };
    match state.target {
        PassTarget::Pick => wgpu::ColorTargetState {
            format: PICK_FORMAT,
            blend: None,
            write_mask,
        },
        PassTarget::Colour => wgpu::ColorTargetState {
            format: colour_format,
            blend: state.blend.then_some(wgpu::BlendState::ALPHA_BLENDING),
            write_mask,
        },
    }
}

/// Primitive state for a pass drawing `mode`. Line fill degrades to
/// filled triangles when the device lacks line polygon support.
#[must_use]
pub fn primitive_state(mode: PrimitiveMode, state: &PassState, line_polygons: bool) -> wgpu::PrimitiveState {
    let polygon_mode = match state.polygon {
        PolygonMode::Line { .. } if line_polygons => wgpu::PolygonMode::Line,
        _ => wgpu::PolygonMode::Fill,
    };
    wgpu::PrimitiveState {
        topology: mode.topology(),
        polygon_mode,
        cull_mode: None,
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::pass::RenderPass;

    #[test]
    fn stencil_pass_writes_one_without_depth() {
        let ds = depth_stencil_state(&RenderPass::Stencil.state(true));
        assert!(!ds.depth_write_enabled);
        assert_eq!(ds.depth_compare, wgpu::CompareFunction::Always);
        assert_eq!(ds.stencil.front.pass_op, wgpu::StencilOperation::Replace);
        assert_eq!(ds.stencil.write_mask, 0xff);
    }

    #[test]
    fn outline_pass_tests_stencil_read_only() {
        let ds = depth_stencil_state(&RenderPass::DrawOutline.state(true));
        assert_eq!(ds.stencil.front.compare, wgpu::CompareFunction::NotEqual);
        assert_eq!(ds.stencil.write_mask, 0);
    }

    #[test]
    fn blended_pass_uses_equal_depth_and_alpha_blend() {
        let state = RenderPass::DrawTransparent.state(true);
        let ds = depth_stencil_state(&state);
        assert_eq!(ds.depth_compare, wgpu::CompareFunction::Equal);
        let target = colour_target(&state, wgpu::TextureFormat::Rgba8Unorm);
        assert_eq!(target.blend, Some(wgpu::BlendState::ALPHA_BLENDING));
        assert_eq!(target.write_mask, wgpu::ColorWrites::ALL);
    }

    #[test]
    fn prepass_masks_colour() {
        let target = colour_target(&RenderPass::DepthShaded.state(true), wgpu::TextureFormat::Rgba8Unorm);
        assert_eq!(target.write_mask, wgpu::ColorWrites::empty());
    }

    #[test]
    fn pick_pass_targets_integer_names() {
        let target = colour_target(&RenderPass::Pick.state(true), wgpu::TextureFormat::Rgba8Unorm);
        assert_eq!(target.format, PICK_FORMAT);
        assert!(target.blend.is_none());
    }

    #[test]
    fn line_mode_needs_device_support() {
        let state = RenderPass::DrawOutline.state(true);
        let with = primitive_state(PrimitiveMode::TriangleStrip, &state, true);
        let without = primitive_state(PrimitiveMode::TriangleStrip, &state, false);
        assert_eq!(with.polygon_mode, wgpu::PolygonMode::Line);
        assert_eq!(without.polygon_mode, wgpu::PolygonMode::Fill);
        assert_eq!(with.topology, wgpu::PrimitiveTopology::TriangleStrip);
    }
}
