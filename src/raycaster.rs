//! Grid-stepping (DDA) ray caster.
//!
//! A ray is advanced from one grid line to the next, always to whichever
//! of the next vertical or horizontal boundary is nearer, so every cell the
//! ray passes through is visited exactly once.

use crate::camera::Camera;
use crate::math::Vec2;
use crate::world::{Cell, WallDescriptor, WorldGrid};

/// Largest texture coordinate; keeps `u` strictly below 1.
const U_MAX: f32 = 1.0 - f32::EPSILON;

/// Face of the struck cell. North is +Y, east is +X.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    North,
    South,
    East,
    West,
}

impl Side {
    /// True for faces lying along a vertical grid line (x = const).
    #[inline]
    pub fn is_vertical(self) -> bool {
        matches!(self, Side::East | Side::West)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub cell: Cell,
    pub wall: WallDescriptor,
    /// Exact intersection with the struck face.
    pub point: Vec2,
    pub side: Side,
    /// Euclidean distance from the ray origin.
    pub distance: f32,
    /// Distance projected on the view direction (fisheye corrected).
    pub perp_distance: f32,
    /// Horizontal texture coordinate in `[0, 1)`, left to right as seen
    /// from outside the cell.
    pub u: f32,
}

/// Traces the ray for one screen column. `None` means nothing was hit within
/// `max_distance`.
#[inline]
pub fn cast_column(
    camera: &Camera,
    world: &WorldGrid,
    column: usize,
    screen_width: usize,
    max_distance: f32,
) -> Option<RayHit> {
    let ray = camera.ray_direction(column, screen_width);
    cast_ray(
        world,
        camera.position(),
        camera.direction(),
        ray,
        max_distance,
    )
}

/// Traces `ray` from `origin` and returns the first wall cell it enters.
///
/// `view_dir` must be unit length; the reported perpendicular distance is
/// the Euclidean distance times the cosine of the angle between `ray` and
/// `view_dir`. The cell containing `origin` itself is never reported.
pub fn cast_ray(
    world: &WorldGrid,
    origin: Vec2,
    view_dir: Vec2,
    ray: Vec2,
    max_distance: f32,
) -> Option<RayHit> {
    let ray_len = ray.length();
    debug_assert!(
        ray_len > 0.0 && ray_len.is_finite() && origin.is_finite(),
        "degenerate ray {ray:?} from {origin:?}"
    );
    if !(ray_len > 0.0 && ray_len.is_finite()) {
        return None;
    }

    let mut cell = Cell::containing(origin);
    let (step_x, delta_x, mut next_x) = axis_setup(origin.x, ray.x, cell.x);
    let (step_y, delta_y, mut next_y) = axis_setup(origin.y, ray.y, cell.y);

    // `t` is measured in multiples of `ray`
    let max_t = max_distance / ray_len;

    loop {
        let (t, side) = if next_x <= next_y {
            let t = next_x;
            next_x += delta_x;
            cell.x = cell.x.saturating_add(step_x);
            (t, if step_x > 0 { Side::West } else { Side::East })
        } else {
            let t = next_y;
            next_y += delta_y;
            cell.y = cell.y.saturating_add(step_y);
            (t, if step_y > 0 { Side::South } else { Side::North })
        };

        // also catches NaN and the both-axes-infinite case
        if !(t <= max_t) {
            return None;
        }

        if let Some(&wall) = world.get(cell) {
            let mut point = origin + ray * t;
            // pin the crossed coordinate to the exact grid line
            match side {
                Side::West => point.x = cell.x as f32,
                Side::East => point.x = cell.x as f32 + 1.0,
                Side::South => point.y = cell.y as f32,
                Side::North => point.y = cell.y as f32 + 1.0,
            }

            return Some(RayHit {
                cell,
                wall,
                point,
                side,
                distance: t * ray_len,
                perp_distance: t * ray.dot(view_dir),
                u: face_u(point, cell, side),
            });
        }
    }
}

/// Per-axis DDA state: step sign, `t` between grid lines, `t` to the first line.
#[inline]
fn axis_setup(origin: f32, dir: f32, cell: i32) -> (i32, f32, f32) {
    if dir > 0.0 {
        (1, 1.0 / dir, (cell as f32 + 1.0 - origin) / dir)
    } else if dir < 0.0 {
        (-1, -1.0 / dir, (origin - cell as f32) / -dir)
    } else {
        // parallel to this axis, never crosses its grid lines
        (0, f32::INFINITY, f32::INFINITY)
    }
}

/// Texture coordinate from the exact hit point, relative to the struck cell.
#[inline]
fn face_u(point: Vec2, cell: Cell, side: Side) -> f32 {
    let along = if side.is_vertical() {
        point.y - cell.y as f32
    } else {
        point.x - cell.x as f32
    };
    let along = along.clamp(0.0, U_MAX);
    match side {
        Side::West | Side::North => (1.0 - along).min(U_MAX),
        Side::East | Side::South => along,
    }
}
