//! Error types for world, texture and configuration loading.
//!
//! Everything here is surfaced before the first frame. Rendering itself
//! never fails: a ray that finds nothing is an ordinary `None`.

use std::path::PathBuf;

use crate::world::{Cell, TextureId};

pub type Result<T> = std::result::Result<T, RaycastError>;

#[derive(Debug, thiserror::Error)]
pub enum RaycastError {
    #[error("cell ({}, {}) references unknown texture {texture}", .cell.x, .cell.y)]
    UnknownTexture { cell: Cell, texture: TextureId },

    #[error("texture {texture} is {found}x{found}, expected {expected}x{expected}")]
    TextureSize {
        texture: TextureId,
        expected: u32,
        found: u32,
    },

    #[error("texture is {width}x{height}, textures must be square")]
    TextureNotSquare { width: u32, height: u32 },

    #[error("texture size {0} is not a power of two")]
    TextureSizeNotPowerOfTwo(u32),

    #[error("degenerate camera: {0}")]
    DegenerateCamera(&'static str),

    #[error("map line {line}, column {column}: unexpected character {found:?}")]
    MapParse {
        line: usize,
        column: usize,
        found: char,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode image {}: {source}", .path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to parse configuration: {0}")]
    Toml(#[from] toml::de::Error),
}
