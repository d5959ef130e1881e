//! Per-object render state and the geometry-writer contract.
//!
//! A [`Renderable`] owns a [`RenderState`] and knows how many vertices it
//! needs and how to write them. Where those vertices live is tracked by the
//! [`store::RenderableStore`] that owns it.

pub mod store;

use std::collections::BTreeSet;

use crate::colour::Colour;
use crate::gpu::buffer_pool::{BufferKey, Occupancy};
use crate::gpu::geometry_buffer::{BufferError, GeometryBuffer, PrimitiveMode};
use crate::registry::Token;
use crate::renderer::draw_list::ShadingStyle;
use crate::renderer::pass::RenderTag;

/// What a state mutation means for an occupant's geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    /// Nothing geometric changed.
    Unchanged,
    /// Vertex contents changed but count and bucket did not; rewrite in
    /// place.
    Appearance,
    /// Bucket, vertex count or visibility changed; the occupant must move.
    Placement,
}

/// Render attributes shared by every renderable kind.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderState {
    /// Host-controlled display flag.
    pub display: bool,
    /// Selection-controlled visibility flag.
    pub visible: bool,
    /// Material colour.
    pub colour: Colour,
    /// Material alpha.
    pub alpha: u8,
    /// Colour replacing the material colour in written vertices.
    pub tint: Option<Colour>,
    /// Colour used by the outline pass.
    pub highlight: Option<Colour>,
    /// Render format token.
    pub format: Token,
    /// Enabled render option tokens.
    pub options: BTreeSet<Token>,
    /// Pass tag.
    pub tag: RenderTag,
    /// Pick name (0 = not pickable).
    pub name: u32,
    pub(crate) occupancy: Option<Occupancy>,
}

impl RenderState {
    /// Visible, displayed, solid state in `format`.
    #[must_use]
    pub fn new(format: Token, colour: Colour, alpha: u8) -> Self {
        Self {
            display: true,
            visible: true,
            colour,
            alpha,
            tint: None,
            highlight: None,
            format,
            options: BTreeSet::new(),
            tag: RenderTag::Solid,
            name: 0,
            occupancy: None,
        }
    }

    /// Whether the occupant should have geometry.
    #[must_use]
    pub fn is_shown(&self) -> bool {
        self.display && self.visible
    }

    /// Whether `option` is enabled.
    #[must_use]
    pub fn has_option(&self, option: Token) -> bool {
        self.options.contains(&option)
    }

    /// Colour written into vertices: the tint if set, else the material
    /// colour, with the material alpha.
    #[must_use]
    pub fn vertex_colour(&self) -> [u8; 4] {
        self.tint.unwrap_or(self.colour).with_alpha(self.alpha)
    }

    /// Current geometry location.
    #[must_use]
    pub fn occupancy(&self) -> Option<Occupancy> {
        self.occupancy
    }
}

/// An object that writes its own geometry into a [`GeometryBuffer`].
///
/// `Context` carries manager-level data the writer needs (tessellation
/// tables, backbone paths) and is borrowed separately from the store.
pub trait Renderable {
    /// Manager data shared by all renderables of this kind.
    type Context;

    /// Render attributes.
    fn state(&self) -> &RenderState;

    /// Mutable render attributes.
    fn state_mut(&mut self) -> &mut RenderState;

    /// Primitive assembly of the written vertices.
    fn primitive_mode(&self, ctx: &Self::Context) -> PrimitiveMode;

    /// Vertices [`Self::write_geometry`] writes in the current state.
    fn vertex_count(&self, ctx: &Self::Context) -> u32;

    /// Write exactly [`Self::vertex_count`] vertices starting at the
    /// buffer's cursor.
    ///
    /// # Errors
    ///
    /// [`BufferError::CapacityExceeded`] if the buffer runs out of room.
    fn write_geometry(
        &self,
        ctx: &Self::Context,
        buffer: &mut GeometryBuffer,
    ) -> Result<(), BufferError>;

    /// How shaders should read vertices written in `format`.
    fn shading(ctx: &Self::Context, format: Token) -> ShadingStyle;

    /// Bucket this renderable belongs in.
    fn buffer_key(&self, ctx: &Self::Context) -> BufferKey {
        let state = self.state();
        BufferKey {
            format: state.format,
            tag: state.tag,
            mode: self.primitive_mode(ctx),
        }
    }
}

/// Write one vertex and advance.
///
/// # Errors
///
/// [`BufferError::CapacityExceeded`] if the buffer is full.
pub(crate) fn emit(
    buffer: &mut GeometryBuffer,
    position: glam::Vec3,
    normal: glam::Vec3,
    colour: [u8; 4],
) -> Result<(), BufferError> {
    buffer.try_write_position(position)?;
    buffer.try_write_normal(normal)?;
    buffer.try_write_colour(colour)?;
    buffer.try_advance()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tint_replaces_material_colour() {
        let mut state = RenderState::new(Token::from_raw(1), Colour::new(1, 2, 3), 9);
        assert_eq!(state.vertex_colour(), [1, 2, 3, 9]);
        state.tint = Some(Colour::new(7, 7, 7));
        assert_eq!(state.vertex_colour(), [7, 7, 7, 9]);
    }

    #[test]
    fn shown_needs_both_flags() {
        let mut state = RenderState::new(Token::from_raw(1), Colour::new(0, 0, 0), 0);
        assert!(state.is_shown());
        state.visible = false;
        assert!(!state.is_shown());
        state.visible = true;
        state.display = false;
        assert!(!state.is_shown());
    }
}
