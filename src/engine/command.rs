//! State mutations applied to every renderable in a selection.
//!
//! A [`Command`] is a plain value; [`Command::apply`] mutates a
//! [`RenderState`] and reports what the mutation means for the occupant's
//! geometry so the owning store can relocate or rewrite it.

use crate::colour::Colour;
use crate::registry::Token;
use crate::renderable::{Change, RenderState};
use crate::renderer::pass::RenderTag;

/// One render-state mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    // ── Visibility ──
    /// Host display flag.
    SetDisplay(bool),
    /// Selection visibility flag.
    SetVisible(bool),

    // ── Representation ──
    /// Render format token.
    SetRenderFormat(Token),
    /// Enable or disable a render option token.
    SetRenderOption(Token, bool),
    /// Pass tag.
    SetTag(RenderTag),

    // ── Material ──
    /// Material colour.
    SetColour(Colour),
    /// Material alpha.
    SetAlpha(u8),
    /// Tint colour replacing the material colour, or `None` to clear.
    SetTintColour(Option<Colour>),
    /// Outline highlight colour, or `None` to clear.
    SetHighlightColour(Option<Colour>),
}

impl Command {
    /// Apply to `state`. Setting a value it already has is a no-op.
    pub fn apply(&self, state: &mut RenderState) -> Change {
        fn set<T: PartialEq>(slot: &mut T, value: T, change: Change) -> Change {
            if *slot == value {
                return Change::Unchanged;
            }
            *slot = value;
            change
        }

        match self {
            Self::SetDisplay(flag) => set(&mut state.display, *flag, Change::Placement),
            Self::SetVisible(flag) => set(&mut state.visible, *flag, Change::Placement),
            Self::SetRenderFormat(format) => {
                set(&mut state.format, *format, Change::Placement)
            }
            Self::SetRenderOption(option, flag) => {
                let changed = if *flag {
                    state.options.insert(*option)
                } else {
                    state.options.remove(option)
                };
                if changed {
                    Change::Placement
                } else {
                    Change::Unchanged
                }
            }
            Self::SetTag(tag) => set(&mut state.tag, *tag, Change::Placement),
            Self::SetColour(colour) => set(&mut state.colour, *colour, Change::Appearance),
            Self::SetAlpha(alpha) => set(&mut state.alpha, *alpha, Change::Appearance),
            Self::SetTintColour(tint) => set(&mut state.tint, *tint, Change::Appearance),
            Self::SetHighlightColour(colour) => {
                state.highlight = *colour;
                Change::Unchanged
            }
        }
    }

    /// Render format this command switches to, if any.
    #[must_use]
    pub fn render_format(&self) -> Option<Token> {
        match self {
            Self::SetRenderFormat(format) => Some(*format),
            _ => None,
        }
    }
}
