//! Vertex storage and GPU resource management.
//!
//! The CPU side (formats, geometry buffers, pools) is usable without a
//! device; [`dynamic_buffer`] and [`render_context`] hold the wgpu half.

/// Bucketed pools of geometry buffers.
pub mod buffer_pool;
/// wgpu vertex buffers mirroring the pools.
pub mod dynamic_buffer;
/// Fixed-capacity vertex storage with upload bookkeeping.
pub mod geometry_buffer;
/// wgpu device, surface, and queue initialization.
pub mod render_context;
/// Vertex format descriptors.
pub mod vertex_format;
