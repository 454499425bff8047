use crate::camera::Camera;
use crate::world::WorldGrid;

/// Movement requested for one tick, each axis in `-1.0..=1.0`.
///
/// `forward` is positive ahead, `strafe` positive to the right and `turn`
/// positive counter-clockwise (to the left).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MoveIntent {
    pub forward: f32,
    pub strafe: f32,
    pub turn: f32,
}

impl MoveIntent {
    #[inline]
    pub fn is_idle(&self) -> bool {
        self.forward == 0.0 && self.strafe == 0.0 && self.turn == 0.0
    }

    /// Applies the intent to `camera` for a tick of `dt` seconds: rotate
    /// first, then translate along the new heading. Diagonal movement is not
    /// faster than straight movement.
    pub fn apply(
        &self,
        camera: &mut Camera,
        world: &WorldGrid,
        dt: f32,
        move_speed: f32,
        turn_speed: f32,
    ) {
        let turn = self.turn.clamp(-1.0, 1.0);
        if turn != 0.0 {
            camera.rotate(turn * turn_speed * dt);
        }

        let mut fwd = self.forward.clamp(-1.0, 1.0);
        let mut strafe = self.strafe.clamp(-1.0, 1.0);
        let len = (fwd * fwd + strafe * strafe).sqrt();
        if len > 1.0 {
            fwd /= len;
            strafe /= len;
        }
        if fwd != 0.0 || strafe != 0.0 {
            let step = move_speed * dt;
            camera.move_by(fwd * step, strafe * step, world);
        }
    }
}
