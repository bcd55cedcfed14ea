use std::f32::consts::{FRAC_PI_2, PI, TAU};

use ward_engine::{InputAction, InputSnapshot, MapPoint};

pub(crate) const EYE_HEIGHT: f32 = 1.6;
pub(crate) const PITCH_LIMIT_RADIANS: f32 = FRAC_PI_2;

/// Walkable rectangle, as offsets from the scene origin: x spans
/// `[-left, right]` and z spans `[-front, back]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Boundary {
    pub(crate) left: f32,
    pub(crate) right: f32,
    pub(crate) front: f32,
    pub(crate) back: f32,
}

impl Boundary {
    pub(crate) fn clamp(&self, x: f32, z: f32) -> (f32, f32) {
        (x.clamp(-self.left, self.right), z.clamp(-self.front, self.back))
    }

    pub(crate) fn contains(&self, x: f32, z: f32) -> bool {
        (-self.left..=self.right).contains(&x) && (-self.front..=self.back).contains(&z)
    }

    pub(crate) fn min_corner(&self) -> MapPoint {
        MapPoint::new(-self.left, -self.front)
    }

    pub(crate) fn max_corner(&self) -> MapPoint {
        MapPoint::new(self.right, self.back)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct MoveKeys {
    pub(crate) forward: bool,
    pub(crate) backward: bool,
    pub(crate) left: bool,
    pub(crate) right: bool,
}

impl MoveKeys {
    pub(crate) fn from_snapshot(input: &InputSnapshot) -> Self {
        Self {
            forward: input.is_down(InputAction::MoveForward),
            backward: input.is_down(InputAction::MoveBackward),
            left: input.is_down(InputAction::MoveLeft),
            right: input.is_down(InputAction::MoveRight),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Player {
    pub(crate) x: f32,
    pub(crate) y: f32,
    pub(crate) z: f32,
    pub(crate) yaw: f32,
    pub(crate) pitch: f32,
    keys: MoveKeys,
}

impl Player {
    pub(crate) fn spawn_at(x: f32, z: f32, yaw: f32) -> Self {
        Self {
            x,
            y: EYE_HEIGHT,
            z,
            yaw: wrap_angle(yaw),
            pitch: 0.0,
            keys: MoveKeys::default(),
        }
    }

    pub(crate) fn set_keys(&mut self, keys: MoveKeys) {
        self.keys = keys;
    }

    pub(crate) fn clear_keys(&mut self) {
        self.keys = MoveKeys::default();
    }

    /// Mouse right turns right, mouse down looks down.
    pub(crate) fn apply_look(&mut self, dx: f32, dy: f32, sensitivity: f32) {
        self.yaw = wrap_angle(self.yaw - dx * sensitivity);
        self.pitch =
            (self.pitch - dy * sensitivity).clamp(-PITCH_LIMIT_RADIANS, PITCH_LIMIT_RADIANS);
    }

    pub(crate) fn integrate(&mut self, frame_dt_seconds: f32, speed: f32, boundary: &Boundary) {
        let (dx, dz) = movement_delta(self.keys, self.yaw, speed, frame_dt_seconds);
        let (x, z) = boundary.clamp(self.x + dx, self.z + dz);
        self.x = x;
        self.z = z;
        self.y = EYE_HEIGHT;
    }

    pub(crate) fn position(&self) -> MapPoint {
        MapPoint::new(self.x, self.z)
    }

    pub(crate) fn heading(&self) -> MapPoint {
        let (x, z) = forward_vector(self.yaw);
        MapPoint::new(x, z)
    }
}

/// Yaw 0 looks down -z.
pub(crate) fn forward_vector(yaw: f32) -> (f32, f32) {
    (-yaw.sin(), -yaw.cos())
}

pub(crate) fn right_vector(yaw: f32) -> (f32, f32) {
    (yaw.cos(), -yaw.sin())
}

/// Horizontal displacement for one frame. Diagonals are normalized so they
/// are no faster than a single axis.
pub(crate) fn movement_delta(keys: MoveKeys, yaw: f32, speed: f32, dt: f32) -> (f32, f32) {
    let forward_axis = axis(keys.forward, keys.backward);
    let right_axis = axis(keys.right, keys.left);
    let length = (forward_axis * forward_axis + right_axis * right_axis).sqrt();
    if length <= f32::EPSILON {
        return (0.0, 0.0);
    }

    let (fx, fz) = forward_vector(yaw);
    let (rx, rz) = right_vector(yaw);
    let scale = speed * dt / length;
    (
        (fx * forward_axis + rx * right_axis) * scale,
        (fz * forward_axis + rz * right_axis) * scale,
    )
}

fn axis(positive: bool, negative: bool) -> f32 {
    match (positive, negative) {
        (true, false) => 1.0,
        (false, true) => -1.0,
        _ => 0.0,
    }
}

/// Wraps into (-PI, PI].
pub(crate) fn wrap_angle(angle: f32) -> f32 {
    let wrapped = (angle + PI).rem_euclid(TAU) - PI;
    if wrapped <= -PI {
        wrapped + TAU
    } else {
        wrapped
    }
}
