//! Pipeline lookup and the built-in flat pipelines.
//!
//! The frame encoder asks a [`PipelineProvider`] for a pipeline per
//! (pass, primitive mode, shading style). Hosts may supply their own
//! shaders; anything they leave out is drawn with [`FlatPipelines`], which
//! are built eagerly for every key from `assets/shaders/flat.wgsl`.

use rustc_hash::FxHashMap;

use super::draw_list::ShadingStyle;
use super::pass::{PassState, PassTarget, RenderPass, FRAME_SEQUENCE};
use super::pipeline_util::{colour_target, depth_stencil_state, primitive_state};
use crate::error::MolpassError;
use crate::gpu::geometry_buffer::PrimitiveMode;
use crate::gpu::render_context::RenderContext;
use crate::gpu::vertex_format::{Attribute, ComponentKind, VertexFormat};

/// Everything that selects a distinct pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PipelineKey {
    /// Pass being drawn.
    pub pass: RenderPass,
    /// Primitive assembly.
    pub mode: PrimitiveMode,
    /// Vertex interpretation.
    pub style: ShadingStyle,
    /// Specular term; only ever set for [`RenderPass::Draw`].
    pub specular: bool,
}

impl PipelineKey {
    /// Key for drawing `mode`/`style` in `pass`. `specular` is dropped for
    /// passes that never light with it.
    #[must_use]
    pub fn new(pass: RenderPass, mode: PrimitiveMode, style: ShadingStyle, specular: bool) -> Self {
        Self {
            pass,
            mode,
            style,
            specular: specular && pass == RenderPass::Draw,
        }
    }

    /// Every distinct key, frame passes first, then Pick.
    #[must_use]
    pub fn all() -> Vec<Self> {
        let passes = FRAME_SEQUENCE.iter().copied().chain([RenderPass::Pick]);
        let mut keys = Vec::new();
        for pass in passes {
            for mode in [PrimitiveMode::Triangles, PrimitiveMode::TriangleStrip] {
                for style in [ShadingStyle::Mesh, ShadingStyle::Billboard] {
                    keys.push(Self::new(pass, mode, style, false));
                    if pass == RenderPass::Draw {
                        keys.push(Self::new(pass, mode, style, true));
                    }
                }
            }
        }
        keys
    }

    /// Pass state this key was built for.
    #[must_use]
    pub fn state(&self) -> PassState {
        self.pass.state(self.specular)
    }
}

/// Supplies pipelines by key. `None` means "use the built-in pipeline".
pub trait PipelineProvider {
    /// Pipeline to bind for `key`, if this provider has one.
    fn pipeline(&self, key: &PipelineKey) -> Option<&wgpu::RenderPipeline>;
}

/// Provider with no pipelines; every draw falls back to [`FlatPipelines`].
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPipelines;

impl PipelineProvider for NoPipelines {
    fn pipeline(&self, _key: &PipelineKey) -> Option<&wgpu::RenderPipeline> {
        None
    }
}

fn vertex_entry(style: ShadingStyle) -> &'static str {
    match style {
        ShadingStyle::Mesh => "vs_mesh",
        ShadingStyle::Billboard => "vs_billboard",
    }
}

fn fragment_entry(pass: RenderPass, state: &PassState) -> &'static str {
    if state.target == PassTarget::Pick {
        return "fs_pick";
    }
    if pass == RenderPass::DrawOutline {
        return "fs_outline";
    }
    match (state.colour_write && state.lighting, state.specular) {
        (true, true) => "fs_lit_specular",
        (true, false) => "fs_lit",
        (false, _) => "fs_unlit",
    }
}

/// Vertex attributes for the flat shader, which reads a 3-float position,
/// a normal and an RGBA colour.
fn flat_attributes(format: &VertexFormat) -> Result<Vec<wgpu::VertexAttribute>, MolpassError> {
    let unsupported = || MolpassError::UnsupportedVertexFormat(format.to_string());
    let position = format.slot(Attribute::Position).ok_or_else(unsupported)?;
    let colour = format.slot(Attribute::Colour).ok_or_else(unsupported)?;
    if position.components != 3
        || !format.has(Attribute::Normal)
        || colour.components != 4
        || colour.kind != ComponentKind::Unorm8
    {
        return Err(unsupported());
    }
    format.wgpu_attributes().ok_or_else(unsupported)
}

/// Built-in pipelines covering every [`PipelineKey`].
pub struct FlatPipelines {
    camera_layout: wgpu::BindGroupLayout,
    pipelines: FxHashMap<PipelineKey, wgpu::RenderPipeline>,
}

impl FlatPipelines {
    /// Build every pipeline for vertices of `format`, drawing into the
    /// context's colour format.
    ///
    /// # Errors
    ///
    /// [`MolpassError::UnsupportedVertexFormat`] if `format` lacks a
    /// 3-float position, a normal or an RGBA colour, or has no GPU layout.
    pub fn new(context: &RenderContext, format: &VertexFormat) -> Result<Self, MolpassError> {
        let attributes = flat_attributes(format)?;
        let device = &context.device;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Flat Shader"),
            source: wgpu::ShaderSource::Wgsl(
                include_str!("../../assets/shaders/flat.wgsl").into(),
            ),
        });

        let camera_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Camera Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Flat Pipeline Layout"),
            bind_group_layouts: &[&camera_layout],
            push_constant_ranges: &[],
        });

        let vertex_layout = wgpu::VertexBufferLayout {
            array_stride: format.stride() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &attributes,
        };

        let mut pipelines = FxHashMap::default();
        for key in PipelineKey::all() {
            let state = key.state();
            let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(&format!("Flat {} Pipeline", key.pass)),
                layout: Some(&layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some(vertex_entry(key.style)),
                    buffers: &[vertex_layout.clone()],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some(fragment_entry(key.pass, &state)),
                    targets: &[Some(colour_target(&state, context.format()))],
                    compilation_options: Default::default(),
                }),
                primitive: primitive_state(key.mode, &state, context.line_polygons),
                depth_stencil: Some(depth_stencil_state(&state)),
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            });
            let _ = pipelines.insert(key, pipeline);
        }
        log::debug!("built {} flat pipelines for vertex format '{format}'", pipelines.len());

        Ok(Self {
            camera_layout,
            pipelines,
        })
    }

    /// Layout of the camera uniform bind group (group 0).
    #[must_use]
    pub fn camera_layout(&self) -> &wgpu::BindGroupLayout {
        &self.camera_layout
    }
}

impl PipelineProvider for FlatPipelines {
    fn pipeline(&self, key: &PipelineKey) -> Option<&wgpu::RenderPipeline> {
        self.pipelines.get(key)
    }
}
