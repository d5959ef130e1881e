use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::renderer::frame::FrameTargets;

/// Row pitch of the one-pixel copy; wgpu requires 256-byte rows.
const ROW_BYTES: u32 = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;

/// Asynchronous one-pixel readback of the pick target.
///
/// Call [`Self::copy_pixel`] after encoding the pick pass, submit, then
/// [`Self::start_readback`]. [`Self::complete_readback`] polls without
/// blocking and yields the raw pick value once the copy lands.
pub struct PickReadback {
    staging_buffer: wgpu::Buffer,
    copied: bool,
    readback_in_flight: bool,
    map_complete: Arc<AtomicBool>,
}

impl PickReadback {
    /// Readback with its own staging buffer.
    #[must_use]
    pub fn new(device: &wgpu::Device) -> Self {
        let staging_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Pick Staging Buffer"),
            size: u64::from(ROW_BYTES),
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });
        Self {
            staging_buffer,
            copied: false,
            readback_in_flight: false,
            map_complete: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Copy the pick value under `(x, y)` into the staging buffer.
    /// Ignored while a readback is in flight or outside the target.
    pub fn copy_pixel(
        &mut self,
        encoder: &mut wgpu::CommandEncoder,
        targets: &FrameTargets,
        (x, y): (u32, u32),
    ) {
        let (width, height) = targets.size();
        if x >= width || y >= height || self.readback_in_flight {
            return;
        }
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: targets.pick_texture(),
                mip_level: 0,
                origin: wgpu::Origin3d { x, y, z: 0 },
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &self.staging_buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(ROW_BYTES),
                    rows_per_image: Some(1),
                },
            },
            wgpu::Extent3d {
                width: 1,
                height: 1,
                depth_or_array_layers: 1,
            },
        );
        self.copied = true;
    }

    /// Request the staging buffer mapping. Call after the copy has been
    /// submitted.
    pub fn start_readback(&mut self) {
        if self.readback_in_flight || !self.copied {
            return;
        }
        self.readback_in_flight = true;
        self.copied = false;
        self.map_complete.store(false, Ordering::SeqCst);
        let map_complete = Arc::clone(&self.map_complete);
        self.staging_buffer
            .slice(..4)
            .map_async(wgpu::MapMode::Read, move |result| {
                if result.is_ok() {
                    map_complete.store(true, Ordering::SeqCst);
                }
            });
    }

    /// Raw pick value if the mapping has completed, `None` while pending.
    pub fn complete_readback(&mut self, device: &wgpu::Device) -> Option<u32> {
        if !self.readback_in_flight {
            return None;
        }
        let _ = device.poll(wgpu::PollType::Poll);
        if !self.map_complete.load(Ordering::SeqCst) {
            return None;
        }

        let raw = {
            let data = self.staging_buffer.slice(..4).get_mapped_range();
            u32::from_le_bytes([data[0], data[1], data[2], data[3]])
        };
        self.staging_buffer.unmap();
        self.readback_in_flight = false;
        Some(raw)
    }

    /// Returns `true` while a mapping is outstanding.
    #[must_use]
    pub fn in_flight(&self) -> bool {
        self.readback_in_flight
    }
}
