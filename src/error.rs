//! Crate-level error types.

use std::fmt;

use crate::gpu::render_context::RenderContextError;

/// Errors produced by the molpass crate.
#[derive(Debug)]
pub enum MolpassError {
    /// GPU context initialization failure.
    Gpu(RenderContextError),
    /// Generic I/O failure.
    Io(std::io::Error),
    /// TOML options parsing/serialization failure.
    OptionsParse(String),
    /// Malformed colour map record.
    ColourMapParse {
        /// 1-based line number.
        line: usize,
        /// What was wrong with the record.
        message: String,
    },
    /// Vertex format the GPU pipelines cannot consume.
    UnsupportedVertexFormat(String),
}

impl fmt::Display for MolpassError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gpu(e) => write!(f, "GPU error: {e}"),
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::OptionsParse(msg) => {
                write!(f, "options parse error: {msg}")
            }
            Self::ColourMapParse { line, message } => {
                write!(f, "colour map line {line}: {message}")
            }
            Self::UnsupportedVertexFormat(format) => {
                write!(f, "vertex format '{format}' has no GPU layout")
            }
        }
    }
}

impl std::error::Error for MolpassError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Gpu(e) => Some(e),
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<RenderContextError> for MolpassError {
    fn from(e: RenderContextError) -> Self {
        Self::Gpu(e)
    }
}

impl From<std::io::Error> for MolpassError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}
