//! Crate-level error types.

use std::fmt;

use crate::gpu::GraphicsError;

/// Errors produced by the shadefall crate.
///
/// Render surfaces never return these; they fall back instead. This type
/// covers the fallible edges around them: theme documents, files, and
/// direct use of the GPU helpers.
#[derive(Debug)]
pub enum ShadefallError {
    /// GPU operation failure.
    Graphics(GraphicsError),
    /// Theme document parsing/serialization failure.
    ThemeParse(String),
    /// Generic I/O failure.
    Io(std::io::Error),
}

impl fmt::Display for ShadefallError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Graphics(e) => write!(f, "graphics error: {e}"),
            Self::ThemeParse(msg) => write!(f, "theme parse error: {msg}"),
            Self::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for ShadefallError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Graphics(e) => Some(e),
            Self::Io(e) => Some(e),
            Self::ThemeParse(_) => None,
        }
    }
}

impl From<GraphicsError> for ShadefallError {
    fn from(e: GraphicsError) -> Self {
        Self::Graphics(e)
    }
}

impl From<std::io::Error> for ShadefallError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}
