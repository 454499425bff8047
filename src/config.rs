use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{RaycastError, Result};
use crate::framebuffer::pack_rgb;
use crate::world::TextureId;

/// Internal framebuffer and tracing parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderConfig {
    pub width: usize,
    pub height: usize,
    /// Rays that travel this far (in cells) without a hit report nothing.
    pub max_trace_distance: f32,
    /// Walls darken linearly and are black at this distance. 0 disables
    /// the fade.
    pub fade_distance: f32,
    pub ceiling_color: [u8; 3],
    pub floor_color: [u8; 3],
    /// Cast columns and fill rows on the rayon pool.
    pub parallel: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 320,
            height: 200,
            max_trace_distance: 64.0,
            fade_distance: 0.0,
            ceiling_color: [56, 56, 56],
            floor_color: [112, 112, 112],
            parallel: true,
        }
    }
}

impl RenderConfig {
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(RaycastError::InvalidConfig(format!(
                "framebuffer must be non-empty, got {}x{}",
                self.width, self.height
            )));
        }
        if !(self.max_trace_distance > 0.0 && self.max_trace_distance.is_finite()) {
            return Err(RaycastError::InvalidConfig(format!(
                "max_trace_distance must be positive and finite, got {}",
                self.max_trace_distance
            )));
        }
        if !(self.fade_distance >= 0.0 && self.fade_distance.is_finite()) {
            return Err(RaycastError::InvalidConfig(format!(
                "fade_distance must be zero or positive and finite, got {}",
                self.fade_distance
            )));
        }
        Ok(())
    }

    /// Wall brightness at perpendicular distance `perp`, in `[0, 1]`.
    #[inline]
    pub fn wall_brightness(&self, perp: f32) -> f32 {
        if self.fade_distance > 0.0 {
            (1.0 - perp / self.fade_distance).clamp(0.0, 1.0)
        } else {
            1.0
        }
    }

    #[inline]
    pub fn ceiling_rgb(&self) -> u32 {
        let [r, g, b] = self.ceiling_color;
        pack_rgb(r, g, b)
    }

    #[inline]
    pub fn floor_rgb(&self) -> u32 {
        let [r, g, b] = self.floor_color;
        pack_rgb(r, g, b)
    }
}

/// Settings for the windowed viewer.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ViewerConfig {
    pub window_width: u32,
    pub window_height: u32,
    /// Horizontal field of view of the viewer camera.
    pub fov_degrees: f32,
    /// Cells per second.
    pub move_speed: f32,
    /// Radians per second.
    pub turn_speed: f32,
    /// ASCII map file; the built-in demo map is used when absent.
    pub map: Option<PathBuf>,
    pub texture_size: u32,
    /// Texture id (as written in the map) to image file. TOML keys are
    /// strings, so ids are parsed by [`ViewerConfig::texture_files`].
    pub textures: BTreeMap<String, PathBuf>,
    pub render: RenderConfig,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            window_width: 960,
            window_height: 600,
            fov_degrees: 66.0,
            move_speed: 3.0,
            turn_speed: std::f32::consts::PI,
            map: None,
            texture_size: 64,
            textures: BTreeMap::new(),
            render: RenderConfig::default(),
        }
    }
}

impl ViewerConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a TOML file. Relative map and texture paths are resolved
    /// against the file's directory.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| RaycastError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml_str(&text)?;

        if let Some(base) = path.parent() {
            if let Some(map) = config.map.as_mut() {
                *map = base.join(&*map);
            }
            for file in config.textures.values_mut() {
                *file = base.join(&*file);
            }
        }
        log::info!("loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.render.validate()?;
        if self.window_width == 0 || self.window_height == 0 {
            return Err(RaycastError::InvalidConfig("window must be non-empty".into()));
        }
        if !(self.fov_degrees > 0.0 && self.fov_degrees < 180.0) {
            return Err(RaycastError::InvalidConfig(format!(
                "fov_degrees must be in (0, 180), got {}",
                self.fov_degrees
            )));
        }
        if !self.texture_size.is_power_of_two() {
            return Err(RaycastError::TextureSizeNotPowerOfTwo(self.texture_size));
        }
        if !(self.move_speed.is_finite() && self.turn_speed.is_finite()) {
            return Err(RaycastError::InvalidConfig("speeds must be finite".into()));
        }
        self.texture_files().map(|_| ())
    }

    #[inline]
    pub fn fov_radians(&self) -> f32 {
        self.fov_degrees.to_radians()
    }

    pub fn texture_files(&self) -> Result<Vec<(TextureId, &Path)>> {
        self.textures
            .iter()
            .map(|(key, file)| {
                let id = key.trim().parse::<u16>().map_err(|_| {
                    RaycastError::InvalidConfig(format!("texture key {key:?} is not a texture id"))
                })?;
                Ok((TextureId(id), file.as_path()))
            })
            .collect()
    }
}
