use crate::camera::Camera;
use crate::raycaster::RayHit;

/// Walls closer than this are projected as if they were this far away.
const MIN_DISTANCE: f32 = 1e-3;

/// Screen-space wall slab for one column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnSpan {
    /// First wall row, inclusive, clamped to the screen.
    pub top_row: usize,
    /// Last wall row, inclusive, clamped to the screen.
    pub bottom_row: usize,
    pub texture_column: u32,
    // unclamped slab, used to keep texture rows stable when the slab is clipped
    wall_top: f32,
    wall_height: f32,
    texture_size: u32,
}

impl ColumnSpan {
    /// Number of screen rows covered by the wall.
    #[inline]
    pub fn height(&self) -> usize {
        self.bottom_row - self.top_row + 1
    }

    /// Slab height in pixels before clamping to the screen.
    #[inline]
    pub fn projected_height(&self) -> f32 {
        self.wall_height
    }

    /// Nearest texture row for screen row `y`.
    #[inline]
    pub fn texture_row(&self, y: usize) -> u32 {
        let v = (y as f32 + 0.5 - self.wall_top) / self.wall_height;
        let row = (v * self.texture_size as f32).floor();
        (row.max(0.0) as u32).min(self.texture_size - 1)
    }
}

/// Perspective projection of wall hits for a fixed camera and screen size.
#[derive(Debug, Clone, Copy)]
pub struct ColumnProjector {
    screen_height: usize,
    horizon: f32,
    focal: f32,
    texture_size: u32,
}

impl ColumnProjector {
    pub fn new(
        camera: &Camera,
        screen_width: usize,
        screen_height: usize,
        texture_size: u32,
    ) -> Self {
        debug_assert!(texture_size > 0);
        Self {
            screen_height,
            // eye height is half a wall, so the horizon sits mid-screen
            horizon: 0.5 * screen_height as f32,
            focal: camera.focal_length(screen_width),
            texture_size,
        }
    }

    /// Slab height in pixels for a wall at `perp_distance`.
    #[inline]
    pub fn slab_height(&self, perp_distance: f32) -> f32 {
        self.focal / perp_distance.max(MIN_DISTANCE)
    }

    pub fn project(&self, hit: &RayHit) -> ColumnSpan {
        let wall_height = self.slab_height(hit.perp_distance);
        let wall_top = self.horizon - 0.5 * wall_height;
        let wall_bottom = self.horizon + 0.5 * wall_height;

        let last_row = self.screen_height.saturating_sub(1) as i64;
        let top_row = (wall_top.floor() as i64).clamp(0, last_row);
        let bottom_row = (wall_bottom.ceil() as i64 - 1).clamp(top_row, last_row);

        let n = self.texture_size;
        let texture_column = ((hit.u * n as f32).floor().max(0.0) as u32).min(n - 1);

        ColumnSpan {
            top_row: top_row as usize,
            bottom_row: bottom_row as usize,
            texture_column,
            wall_top,
            wall_height,
            texture_size: n,
        }
    }
}
