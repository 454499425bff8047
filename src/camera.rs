use crate::error::{RaycastError, Result};
use crate::math::Vec2;
use crate::world::{Cell, WorldGrid};

/// Closest the camera may get to a wall face, in cells.
pub const WALL_MARGIN: f32 = 0.1;

/// Viewer pose. `dir` is kept unit length; `plane` is the right-pointing
/// camera plane whose half-width is `tan(fov / 2)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pos: Vec2,
    dir: Vec2,
    plane: Vec2,
    fov: f32, // horizontal, radians
}

impl Camera {
    pub fn new(pos: Vec2, dir: Vec2, fov: f32) -> Result<Self> {
        if !pos.is_finite() {
            return Err(RaycastError::DegenerateCamera("position is not finite"));
        }
        let dir = dir
            .normalized()
            .ok_or(RaycastError::DegenerateCamera("direction is zero or not finite"))?;
        check_fov(fov)?;
        Ok(Self {
            pos,
            dir,
            plane: plane_for(dir, fov),
            fov,
        })
    }

    /// Camera looking `angle` radians counter-clockwise from +X (east).
    pub fn facing(pos: Vec2, angle: f32, fov: f32) -> Result<Self> {
        Self::new(pos, Vec2::from_angle(angle), fov)
    }

    #[inline]
    pub fn position(&self) -> Vec2 {
        self.pos
    }

    #[inline]
    pub fn direction(&self) -> Vec2 {
        self.dir
    }

    #[inline]
    pub fn plane(&self) -> Vec2 {
        self.plane
    }

    #[inline]
    pub fn fov(&self) -> f32 {
        self.fov
    }

    pub fn set_fov(&mut self, fov: f32) -> Result<()> {
        check_fov(fov)?;
        self.fov = fov;
        self.plane = plane_for(self.dir, fov);
        Ok(())
    }

    /// Ray through screen column `column` of `screen_width`, sweeping from the
    /// left FOV edge (column 0) toward the right edge. Its projection on `dir`
    /// is always 1, so distances measured along it are already perpendicular.
    #[inline]
    pub fn ray_direction(&self, column: usize, screen_width: usize) -> Vec2 {
        let camera_x = 2.0 * column as f32 / screen_width as f32 - 1.0;
        self.dir + self.plane * camera_x
    }

    /// Distance from the eye to the projection plane, in pixels.
    #[inline]
    pub fn focal_length(&self, screen_width: usize) -> f32 {
        0.5 * screen_width as f32 / (0.5 * self.fov).tan()
    }

    /// Rotates counter-clockwise by `angle` radians. Position is unchanged.
    pub fn rotate(&mut self, angle: f32) {
        assert!(angle.is_finite(), "camera rotation must be finite, got {angle}");
        // renormalize so many small turns don't drift the magnitude
        if let Some(dir) = self.dir.rotated(angle).normalized() {
            self.dir = dir;
            self.plane = plane_for(dir, self.fov);
        }
    }

    /// Moves `forward` along the view direction and `strafe` to the right.
    ///
    /// Each axis is checked separately; an axis whose sweep would enter a wall
    /// cell (or come within [`WALL_MARGIN`] of one) is zeroed, so the camera
    /// slides along walls. Returns the displacement actually applied.
    pub fn move_by(&mut self, forward: f32, strafe: f32, world: &WorldGrid) -> Vec2 {
        assert!(
            forward.is_finite() && strafe.is_finite(),
            "camera movement must be finite, got ({forward}, {strafe})"
        );
        let delta = self.dir * forward + self.dir.perp_right() * strafe;
        let start = self.pos;
        let target = start + delta;
        assert!(
            target.is_finite(),
            "camera movement from {start:?} by {delta:?} leaves the finite plane"
        );

        if delta.x != 0.0 && !sweep_blocked(world, self.pos.x, delta.x, self.pos.y, Axis::X) {
            self.pos.x = target.x;
        }
        if delta.y != 0.0 && !sweep_blocked(world, self.pos.y, delta.y, self.pos.x, Axis::Y) {
            self.pos.y = target.y;
        }

        self.pos - start
    }
}

#[derive(Clone, Copy)]
enum Axis {
    X,
    Y,
}

/// True if moving from `from` by `delta` along `axis` (with the wall margin
/// added in the direction of travel) crosses any solid cell in the row or
/// column fixed at `fixed`.
///
/// Cost is bounded by the smaller of the swept span and the wall count.
fn sweep_blocked(world: &WorldGrid, from: f32, delta: f32, fixed: f32, axis: Axis) -> bool {
    let to = from + delta + WALL_MARGIN.copysign(delta);
    let (a, b) = (from.floor() as i32, to.floor() as i32);
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    let fixed = fixed.floor() as i32;
    let swept = lo..=hi;

    if hi.abs_diff(lo) as usize >= world.len() {
        // long sweep: scan the walls instead of every cell on the way
        return world.iter().any(|(cell, _)| {
            let (along, across) = match axis {
                Axis::X => (cell.x, cell.y),
                Axis::Y => (cell.y, cell.x),
            };
            across == fixed && swept.contains(&along)
        });
    }

    swept.into_iter().any(|i| {
        let cell = match axis {
            Axis::X => Cell::new(i, fixed),
            Axis::Y => Cell::new(fixed, i),
        };
        world.is_solid(cell)
    })
}

fn check_fov(fov: f32) -> Result<()> {
    if fov.is_finite() && fov > 0.0 && fov < std::f32::consts::PI {
        Ok(())
    } else {
        Err(RaycastError::DegenerateCamera("fov must be in (0, pi) radians"))
    }
}

#[inline]
fn plane_for(dir: Vec2, fov: f32) -> Vec2 {
    dir.perp_right() * (0.5 * fov).tan()
}
