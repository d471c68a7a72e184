//! Pose, twist, and transmission value types.

use urb_core::Point3;

/// Gear slot for reverse.  Forward gears start at `GEAR_NEUTRAL + 1`
/// (slot 2 = first gear).
pub const GEAR_REVERSE: u32 = 0;
pub const GEAR_NEUTRAL: u32 = 1;

/// Reference frame selector for twist/acceleration queries.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Frame {
    /// World axes.
    World,
    /// Vehicle body axes: +X forward, +Y left, +Z up.
    Body,
}

/// Pose + twist + linear acceleration of one vehicle.
#[derive(Copy, Clone, Debug, Default)]
pub struct PoseTwistAccel {
    pub pos: Point3,
    /// Orientation quaternion `(x, y, z, w)`.
    pub ori: [f32; 4],
    pub lin_vel: Point3,
    pub ang_vel: Point3,
    /// Finite-differenced from linear velocity over the last step.
    pub lin_accel: Point3,
}

/// Transmission snapshot of one vehicle.
#[derive(Clone, Debug, Default)]
pub struct Transmission {
    pub gear_current: u32,
    pub gear_target:  u32,
    /// Ratio of the current gear (excluding the final drive).
    pub gear_ratio: f32,
    /// Engine speed in rad/s.
    pub engine_speed: f32,
    /// Per-wheel angular speed in rad/s, at most 8 entries.
    pub wheel_speeds: Vec<f32>,
}

/// Build the quaternion for a pure yaw rotation.
#[inline]
pub(crate) fn yaw_quat(yaw: f32) -> [f32; 4] {
    let half = yaw * 0.5;
    [0.0, 0.0, half.sin(), half.cos()]
}
