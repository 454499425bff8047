//! Grid raycaster: renders a first-person view of a textured 2D grid world
//! into a software framebuffer, one ray per screen column.
//!
//! The pipeline per frame is [`Camera`] -> [`raycaster::cast_column`]
//! (grid stepping through the [`WorldGrid`]) -> [`ColumnProjector`]
//! -> pixel writes and a per-column depth entry, driven by [`FrameRenderer`].

pub mod camera;
pub mod config;
pub mod error;
pub mod framebuffer;
pub mod input;
pub mod math;
pub mod present;
pub mod projector;
pub mod raycaster;
pub mod renderer;
pub mod texture;
pub mod world;

pub use camera::Camera;
pub use config::{RenderConfig, ViewerConfig};
pub use error::{RaycastError, Result};
pub use framebuffer::{DepthBuffer, Framebuffer, pack_rgb};
pub use input::MoveIntent;
pub use math::Vec2;
pub use projector::{ColumnProjector, ColumnSpan};
pub use raycaster::{RayHit, Side, cast_column, cast_ray};
pub use renderer::{ColumnSample, FrameRenderer, Scene};
pub use texture::{Texture, TexturePattern, TextureSet, load_texture_set};
pub use world::{Cell, MapDefinition, TextureId, WallDescriptor, WorldGrid};
