// -- Lint policy ---------------------------------------------------------
// This is the single source of truth for crate-wide lints.

// Broad lint groups
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![deny(clippy::nursery)]
// Documentation
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]
#![deny(rustdoc::bare_urls)]
// No panicking in library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
// No debug/print artifacts
#![deny(clippy::dbg_macro)]
#![deny(clippy::print_stdout)]
#![deny(clippy::print_stderr)]
// Import hygiene
#![deny(clippy::wildcard_imports)]
// Complexity limits
#![deny(clippy::cognitive_complexity)]
// Function signature hygiene
#![deny(clippy::fn_params_excessive_bools)]
// Clone / pass-by-value hygiene
#![deny(clippy::needless_pass_by_value)]
#![deny(clippy::implicit_clone)]
// String hygiene
#![deny(clippy::inefficient_to_string)]
#![deny(clippy::redundant_closure_for_method_calls)]
#![deny(clippy::manual_string_new)]
#![deny(clippy::str_to_string)]
// Cargo lints (warn, not deny since cargo lints can be noisy)
#![warn(clippy::cargo)]
// Unused / redundant code
#![deny(unused_results)]
#![deny(unused_qualifications)]
// Cast hygiene
#![deny(trivial_casts)]
#![deny(trivial_numeric_casts)]
// Tests unwrap freely
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

//! Pooled geometry buffers and multi-pass rendering for molecular scenes.
//!
//! Molpass keeps the geometry of atoms and protein chains in shared,
//! format-typed vertex buffers and draws it through a fixed sequence of
//! render passes (stencil, opaque, shaded, transparent, outline) plus an
//! on-demand pick pass.
//!
//! # Key entry points
//!
//! - [`engine::MolecularScene`] - load objects, apply selection commands,
//!   produce per-pass draw lists
//! - [`renderer::frame::FrameEncoder`] - record draw lists into wgpu passes
//! - [`gpu::dynamic_buffer::GpuVertexStore`] - mirror CPU buffers on the GPU
//! - [`options::Options`] - runtime configuration
//!
//! # Architecture
//!
//! Commands mutate per-renderable state and mark stores stale only when an
//! occupant has to move. Before the first pass of a frame every stale store
//! releases invalid occupancies, sweeps dead buffers and writes its shown
//! occupants into buffers acquired from its pool. Colour-only edits rewrite
//! vertices in place and upload just the touched byte range.

pub mod colour;
pub mod engine;
pub mod error;
pub mod gpu;
pub mod options;
pub mod registry;
pub mod renderable;
pub mod renderer;
pub mod scene;
pub mod util;

pub use engine::MolecularScene;
pub use error::MolpassError;
pub use options::Options;
