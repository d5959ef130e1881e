//! Compact vertex format descriptors.
//!
//! A descriptor such as `"position:normal:rgba"` names the attributes of a
//! vertex in order. Parsing packs them with no padding, so two buffers
//! built from the same descriptor always share a layout.

use std::fmt;

/// Descriptor used when none is configured.
pub const DEFAULT_VERTEX_FORMAT: &str = "position:normal:rgba";

/// Vertex attribute kinds a descriptor can name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attribute {
    /// Vertex position (2, 3 or 4 floats).
    Position,
    /// Surface normal (3 floats).
    Normal,
    /// Texture coordinate (1 to 4 floats).
    TexCoord,
    /// Colour (3 or 4 unsigned bytes).
    Colour,
}

impl Attribute {
    /// Shader input location used when building GPU vertex layouts.
    #[must_use]
    pub fn shader_location(self) -> u32 {
        match self {
            Self::Position => 0,
            Self::Normal => 1,
            Self::TexCoord => 2,
            Self::Colour => 3,
        }
    }
}

/// Storage type of one attribute component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentKind {
    /// 32-bit little-endian float.
    Float32,
    /// Normalized unsigned byte.
    Unorm8,
}

impl ComponentKind {
    /// Bytes per component.
    #[must_use]
    pub fn size(self) -> usize {
        match self {
            Self::Float32 => 4,
            Self::Unorm8 => 1,
        }
    }
}

/// One attribute placed inside a vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeSlot {
    /// Which attribute this slot stores.
    pub attribute: Attribute,
    /// Byte offset from the start of the vertex.
    pub offset: usize,
    /// Number of components.
    pub components: usize,
    /// Component storage type.
    pub kind: ComponentKind,
}

impl AttributeSlot {
    /// Size of the slot in bytes.
    #[must_use]
    pub fn size(&self) -> usize {
        self.components * self.kind.size()
    }
}

/// Parsed vertex format: ordered slots plus stride.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexFormat {
    slots: Vec<AttributeSlot>,
    stride: usize,
}

fn token_slot(token: &str) -> Option<(Attribute, usize, ComponentKind)> {
    use ComponentKind::{Float32, Unorm8};
    let slot = match token {
        "position2d" => (Attribute::Position, 2, Float32),
        "position" | "position3d" => (Attribute::Position, 3, Float32),
        "position4d" => (Attribute::Position, 4, Float32),
        "normal" => (Attribute::Normal, 3, Float32),
        "texcoord1d" => (Attribute::TexCoord, 1, Float32),
        "texcoord" | "texcoord2d" => (Attribute::TexCoord, 2, Float32),
        "texcoord3d" => (Attribute::TexCoord, 3, Float32),
        "texcoord4d" => (Attribute::TexCoord, 4, Float32),
        "rgb" => (Attribute::Colour, 3, Unorm8),
        "rgba" => (Attribute::Colour, 4, Unorm8),
        _ => return None,
    };
    Some(slot)
}

impl VertexFormat {
    /// Parse a colon-separated descriptor.
    ///
    /// Unknown tokens are skipped. A repeated attribute keeps its first
    /// slot so offsets stay strictly increasing.
    #[must_use]
    pub fn parse(descriptor: &str) -> Self {
        let mut slots: Vec<AttributeSlot> = Vec::new();
        let mut stride = 0;
        for token in descriptor.split(':').map(str::trim) {
            let Some((attribute, components, kind)) = token_slot(token) else {
                if !token.is_empty() {
                    log::debug!("ignoring unknown vertex format token '{token}'");
                }
                continue;
            };
            if slots.iter().any(|s| s.attribute == attribute) {
                continue;
            }
            let slot = AttributeSlot {
                attribute,
                offset: stride,
                components,
                kind,
            };
            stride += slot.size();
            slots.push(slot);
        }
        Self { slots, stride }
    }

    /// Bytes per vertex.
    #[must_use]
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Slots in declaration order.
    #[must_use]
    pub fn slots(&self) -> &[AttributeSlot] {
        &self.slots
    }

    /// Slot for `attribute`, if the format carries it.
    #[must_use]
    pub fn slot(&self, attribute: Attribute) -> Option<&AttributeSlot> {
        self.slots.iter().find(|s| s.attribute == attribute)
    }

    /// Byte offset of `attribute` within a vertex.
    #[must_use]
    pub fn offset(&self, attribute: Attribute) -> Option<usize> {
        self.slot(attribute).map(|s| s.offset)
    }

    /// Returns `true` if the format carries `attribute`.
    #[must_use]
    pub fn has(&self, attribute: Attribute) -> bool {
        self.slot(attribute).is_some()
    }

    /// wgpu vertex attributes for this format.
    ///
    /// `None` when the layout cannot be expressed on the GPU: a 3-byte
    /// colour has no vertex format, and strides must be 4-byte aligned.
    #[must_use]
    pub fn wgpu_attributes(&self) -> Option<Vec<wgpu::VertexAttribute>> {
        if self.stride == 0 || self.stride % 4 != 0 {
            return None;
        }
        self.slots
            .iter()
            .map(|slot| {
                let format = match (slot.kind, slot.components) {
                    (ComponentKind::Float32, 1) => wgpu::VertexFormat::Float32,
                    (ComponentKind::Float32, 2) => {
                        wgpu::VertexFormat::Float32x2
                    }
                    (ComponentKind::Float32, 3) => {
                        wgpu::VertexFormat::Float32x3
                    }
                    (ComponentKind::Float32, 4) => {
                        wgpu::VertexFormat::Float32x4
                    }
                    (ComponentKind::Unorm8, 4) => wgpu::VertexFormat::Unorm8x4,
                    _ => return None,
                };
                Some(wgpu::VertexAttribute {
                    format,
                    offset: slot.offset as u64,
                    shader_location: slot.attribute.shader_location(),
                })
            })
            .collect()
    }
}

impl Default for VertexFormat {
    fn default() -> Self {
        Self::parse(DEFAULT_VERTEX_FORMAT)
    }
}

impl fmt::Display for VertexFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for slot in &self.slots {
            let token = match (slot.attribute, slot.components) {
                (Attribute::Position, 2) => "position2d",
                (Attribute::Position, 4) => "position4d",
                (Attribute::Position, _) => "position",
                (Attribute::Normal, _) => "normal",
                (Attribute::TexCoord, 1) => "texcoord1d",
                (Attribute::TexCoord, 3) => "texcoord3d",
                (Attribute::TexCoord, 4) => "texcoord4d",
                (Attribute::TexCoord, _) => "texcoord",
                (Attribute::Colour, 3) => "rgb",
                (Attribute::Colour, _) => "rgba",
            };
            if !first {
                f.write_str(":")?;
            }
            f.write_str(token)?;
            first = false;
        }
        Ok(())
    }
}
