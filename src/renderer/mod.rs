//! Pass scheduling and GPU encoding.
//!
//! [`scheduler::PassScheduler`] turns manager state into per-pass
//! [`draw_list::DrawList`]s without touching the GPU. [`frame`] records
//! those lists into wgpu render passes using [`pipelines`].

pub mod draw_list;
pub mod frame;
pub mod molecular;
pub mod pass;
pub mod picking;
pub(crate) mod pipeline_util;
pub mod pipelines;
pub mod scheduler;
