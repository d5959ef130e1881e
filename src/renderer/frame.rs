//! Encoding scheduled passes into wgpu render passes.
//!
//! The eight frame passes share one colour and depth-stencil attachment,
//! so they are recorded into a single wgpu render pass, switching
//! pipelines between them. The pick pass gets its own render pass into the
//! integer pick target.

use glam::{Mat4, Vec3};
use rustc_hash::FxHashSet;
use wgpu::util::DeviceExt;

use super::pipeline_util::{DEPTH_STENCIL_FORMAT, PICK_FORMAT, STENCIL_REFERENCE};
use super::pipelines::{FlatPipelines, PipelineKey, PipelineProvider};
use super::scheduler::PassOutput;
use crate::error::MolpassError;
use crate::gpu::dynamic_buffer::GpuVertexStore;
use crate::gpu::render_context::RenderContext;
use crate::gpu::vertex_format::VertexFormat;
use crate::scene::SceneBounds;

/// Look-at perspective camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    /// Eye position in world space.
    pub eye: Vec3,
    /// Look-at target.
    pub target: Vec3,
    /// Up direction.
    pub up: Vec3,
    /// Width over height.
    pub aspect: f32,
    /// Vertical field of view, degrees.
    pub fovy: f32,
    /// Near plane.
    pub znear: f32,
    /// Far plane.
    pub zfar: f32,
}

impl Camera {
    /// Camera looking down -Z at `bounds`, far enough back to fit the
    /// bounding sphere vertically.
    #[must_use]
    pub fn framing(bounds: &SceneBounds, aspect: f32) -> Self {
        let fovy: f32 = 45.0;
        let distance = bounds.radius / (fovy.to_radians() * 0.5).sin();
        Self {
            eye: bounds.centre + Vec3::Z * distance,
            target: bounds.centre,
            up: Vec3::Y,
            aspect,
            fovy,
            znear: (distance - bounds.radius).max(0.1),
            zfar: distance + bounds.radius,
        }
    }

    /// Projection times view.
    #[must_use]
    pub fn build_matrix(&self) -> Mat4 {
        let view = Mat4::look_at_rh(self.eye, self.target, self.up);
        // perspective_rh already uses [0,1] depth range
        let proj = Mat4::perspective_rh(self.fovy.to_radians(), self.aspect, self.znear, self.zfar);
        proj * view
    }
}

/// GPU uniform holding the view-projection matrix and the billboard basis.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    /// Combined view-projection matrix.
    pub view_proj: [[f32; 4]; 4],
    /// Camera right vector (w unused).
    pub right: [f32; 4],
    /// Camera up vector (w unused).
    pub up: [f32; 4],
    /// Eye position (w unused).
    pub eye: [f32; 4],
    /// Direction light travels (w unused).
    pub light_dir: [f32; 4],
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self {
            view_proj: Mat4::IDENTITY.to_cols_array_2d(),
            right: [1.0, 0.0, 0.0, 0.0],
            up: [0.0, 1.0, 0.0, 0.0],
            eye: [0.0, 0.0, 1.0, 0.0],
            light_dir: [0.0, 0.0, -1.0, 0.0],
        }
    }
}

impl CameraUniform {
    /// Uniform for `camera`, lit from over the viewer's shoulder.
    #[must_use]
    pub fn from_camera(camera: &Camera) -> Self {
        let forward = (camera.target - camera.eye).normalize_or(Vec3::NEG_Z);
        let right = forward.cross(camera.up).normalize_or(Vec3::X);
        let up = right.cross(forward);
        let light = (forward - right * 0.3 - up * 0.4).normalize();
        Self {
            view_proj: camera.build_matrix().to_cols_array_2d(),
            right: right.extend(0.0).to_array(),
            up: up.extend(0.0).to_array(),
            eye: camera.eye.extend(1.0).to_array(),
            light_dir: light.extend(0.0).to_array(),
        }
    }
}

fn attachment(
    device: &wgpu::Device,
    label: &str,
    format: wgpu::TextureFormat,
    (width, height): (u32, u32),
    usage: wgpu::TextureUsages,
) -> (wgpu::Texture, wgpu::TextureView) {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    (texture, view)
}

/// Offscreen attachments: depth-stencil, pick target and, when headless,
/// the colour target.
pub struct FrameTargets {
    size: (u32, u32),
    colour_format: Option<wgpu::TextureFormat>,
    depth_view: wgpu::TextureView,
    pick_texture: wgpu::Texture,
    pick_view: wgpu::TextureView,
    colour: Option<(wgpu::Texture, wgpu::TextureView)>,
}

impl FrameTargets {
    /// Targets of `size`. `offscreen_colour` adds an owned colour target
    /// for rendering without a surface.
    #[must_use]
    pub fn new(
        device: &wgpu::Device,
        size: (u32, u32),
        offscreen_colour: Option<wgpu::TextureFormat>,
    ) -> Self {
        let (_, depth_view) = attachment(
            device,
            "Depth Stencil Texture",
            DEPTH_STENCIL_FORMAT,
            size,
            wgpu::TextureUsages::RENDER_ATTACHMENT,
        );
        let (pick_texture, pick_view) = attachment(
            device,
            "Pick Texture",
            PICK_FORMAT,
            size,
            wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
        );
        let colour = offscreen_colour.map(|format| {
            attachment(
                device,
                "Offscreen Colour Texture",
                format,
                size,
                wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            )
        });
        Self {
            size,
            colour_format: offscreen_colour,
            depth_view,
            pick_texture,
            pick_view,
            colour,
        }
    }

    /// Recreate every attachment at the new size.
    pub fn resize(&mut self, device: &wgpu::Device, size: (u32, u32)) {
        if size != self.size {
            *self = Self::new(device, size, self.colour_format);
        }
    }

    /// Attachment size.
    #[must_use]
    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    /// Owned colour target, if created offscreen.
    #[must_use]
    pub fn colour_view(&self) -> Option<&wgpu::TextureView> {
        self.colour.as_ref().map(|(_, view)| view)
    }

    /// Integer pick texture.
    #[must_use]
    pub fn pick_texture(&self) -> &wgpu::Texture {
        &self.pick_texture
    }
}

/// Counters for one encoded frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EncodeStats {
    /// Draw calls recorded.
    pub draws: usize,
    /// Draws skipped for lack of a GPU buffer or pipeline.
    pub skipped: usize,
}

/// Records [`PassOutput`]s into command encoders.
pub struct FrameEncoder {
    flat: FlatPipelines,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    missing: FxHashSet<PipelineKey>,
}

impl FrameEncoder {
    /// Encoder with built-in pipelines for `format`.
    ///
    /// # Errors
    ///
    /// [`MolpassError::UnsupportedVertexFormat`] if the built-in pipelines
    /// cannot read `format`.
    pub fn new(context: &RenderContext, format: &VertexFormat) -> Result<Self, MolpassError> {
        let flat = FlatPipelines::new(context, format)?;
        let camera_buffer = context
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Camera Buffer"),
                contents: bytemuck::bytes_of(&CameraUniform::default()),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });
        let camera_bind_group = context.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Camera Bind Group"),
            layout: flat.camera_layout(),
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        });
        Ok(Self {
            flat,
            camera_buffer,
            camera_bind_group,
            missing: FxHashSet::default(),
        })
    }

    /// Upload a new camera.
    pub fn update_camera(&self, queue: &wgpu::Queue, camera: &CameraUniform) {
        queue.write_buffer(&self.camera_buffer, 0, bytemuck::bytes_of(camera));
    }

    /// Record the frame passes into `colour`, clearing it to `clear`.
    pub fn encode_frame(
        &mut self,
        encoder: &mut wgpu::CommandEncoder,
        provider: &dyn PipelineProvider,
        vertices: &GpuVertexStore,
        targets: &FrameTargets,
        colour: &wgpu::TextureView,
        clear: wgpu::Color,
        frame: &[PassOutput],
    ) -> EncodeStats {
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Molecular Frame Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: colour,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(clear),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &targets.depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(0),
                    store: wgpu::StoreOp::Store,
                }),
            }),
            ..Default::default()
        });
        render_pass.set_bind_group(0, &self.camera_bind_group, &[]);
        render_pass.set_stencil_reference(STENCIL_REFERENCE);

        let mut stats = EncodeStats::default();
        for output in frame {
            self.record(&mut render_pass, provider, vertices, output, &mut stats);
        }
        stats
    }

    /// Record the pick pass into the pick target.
    pub fn encode_pick(
        &mut self,
        encoder: &mut wgpu::CommandEncoder,
        provider: &dyn PipelineProvider,
        vertices: &GpuVertexStore,
        targets: &FrameTargets,
        pick: &PassOutput,
    ) -> EncodeStats {
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Pick Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &targets.pick_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &targets.depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(0),
                    store: wgpu::StoreOp::Store,
                }),
            }),
            ..Default::default()
        });
        render_pass.set_bind_group(0, &self.camera_bind_group, &[]);

        let mut stats = EncodeStats::default();
        self.record(&mut render_pass, provider, vertices, pick, &mut stats);
        stats
    }

    fn record(
        &mut self,
        render_pass: &mut wgpu::RenderPass<'_>,
        provider: &dyn PipelineProvider,
        vertices: &GpuVertexStore,
        output: &PassOutput,
        stats: &mut EncodeStats,
    ) {
        for call in &output.draws {
            let key = PipelineKey::new(output.pass, call.mode, call.style, output.state.specular);
            let pipeline = match provider.pipeline(&key) {
                Some(pipeline) => pipeline,
                None => {
                    if self.missing.insert(key) {
                        log::debug!("no pipeline provided for {key:?}, using flat shading");
                    }
                    match self.flat.pipeline(&key) {
                        Some(pipeline) => pipeline,
                        None => {
                            stats.skipped += 1;
                            continue;
                        }
                    }
                }
            };
            let Some(buffer) = vertices.buffer(call.pool, call.buffer) else {
                stats.skipped += 1;
                continue;
            };
            let value = call.instance_value();
            render_pass.set_pipeline(pipeline);
            render_pass.set_vertex_buffer(0, buffer.slice(..));
            render_pass.draw(call.vertices.clone(), value..value + 1);
            stats.draws += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn framing_fits_the_bounding_sphere() {
        let bounds = SceneBounds {
            centre: Vec3::new(1.0, 2.0, 3.0),
            radius: 10.0,
        };
        let camera = Camera::framing(&bounds, 1.5);
        assert_eq!(camera.target, bounds.centre);
        let distance = camera.eye.distance(bounds.centre);
        assert!((distance * (22.5f32).to_radians().sin() - 10.0).abs() < 1e-3);
        assert!(camera.znear > 0.0 && camera.zfar > distance);
    }

    #[test]
    fn centre_projects_to_the_middle_of_the_screen() {
        let bounds = SceneBounds {
            centre: Vec3::new(-4.0, 0.5, 9.0),
            radius: 6.0,
        };
        let camera = Camera::framing(&bounds, 1.0);
        let clip = camera.build_matrix() * bounds.centre.extend(1.0);
        let ndc = clip.truncate() / clip.w;
        assert!(ndc.x.abs() < 1e-4 && ndc.y.abs() < 1e-4);
        assert!((0.0..=1.0).contains(&ndc.z));
    }

    #[test]
    fn uniform_basis_is_orthonormal() {
        let camera = Camera::framing(
            &SceneBounds {
                centre: Vec3::ZERO,
                radius: 5.0,
            },
            1.0,
        );
        let uniform = CameraUniform::from_camera(&camera);
        let right = Vec3::from_slice(&uniform.right[..3]);
        let up = Vec3::from_slice(&uniform.up[..3]);
        assert!((right.length() - 1.0).abs() < 1e-5);
        assert!((up.length() - 1.0).abs() < 1e-5);
        assert!(right.dot(up).abs() < 1e-5);
        assert_eq!(size_of::<CameraUniform>(), 128);
    }
}
