//! The `VehicleDynamics` trait — the seam to the physics engine.

use urb_core::{Point2, Point3, VehicleId};

use crate::{DynResult, Frame, PoseTwistAccel, Transmission};

/// Minimal interface the simulator core requires from a wheeled-vehicle
/// engine.
///
/// # Contract
///
/// - Action setters are idempotent within a tick; the last value set wins and
///   takes effect on the next [`update`](Self::update).
/// - `update(dt)` steps every vehicle exactly once.  Implementations batch
///   suspension raycasts across vehicles (see [`raycast`][crate::raycast]).
/// - Acceleration is finite-differenced from linear velocity; an `update`
///   with `dt == 0` must leave the previously computed value readable.
pub trait VehicleDynamics {
    /// Build a vehicle from the named parameter record and return its handle.
    fn create(&mut self, vehicle_name: &str) -> DynResult<VehicleId>;

    /// Release a vehicle.  The handle must not be used afterwards.
    fn destroy(&mut self, id: VehicleId);

    /// Teleport the vehicle, aligning its heading with `dir` (a zero vector
    /// leaves the heading unchanged).
    fn set_position_direction(&mut self, id: VehicleId, pos: Point3, dir: Point2);

    /// Pose, twist, and linear acceleration, with twist/accel expressed in
    /// the requested frame.
    fn pose_twist_accel(&self, id: VehicleId, frame: Frame) -> PoseTwistAccel;

    /// Gearbox and engine snapshot.
    fn transmission(&self, id: VehicleId) -> Transmission;

    // ── Action setters (applied on the next update) ───────────────────────

    fn action_mode(&mut self, id: VehicleId, analog: bool, smoothing: bool);
    /// Steering input in `[-1, 1]`.
    fn action_steer(&mut self, id: VehicleId, value: f32);
    /// Throttle input in `[0, 1]`.
    fn action_accel(&mut self, id: VehicleId, value: f32);
    /// Brake input in `[0, 1]`.
    fn action_brake(&mut self, id: VehicleId, value: f32);
    /// Handbrake input in `[0, 1]`.
    fn action_handbrake(&mut self, id: VehicleId, value: f32);
    /// Select a gear slot (`GEAR_REVERSE`, `GEAR_NEUTRAL`, 2 = first…).
    /// With `target` the box shifts toward it instead of snapping.
    fn action_gear(&mut self, id: VehicleId, gear: u32, target: bool);
    /// Enable or disable automatic shifting.
    fn action_autobox(&mut self, id: VehicleId, enable: bool);

    /// Flush pending inputs and integrate one step.
    fn update(&mut self, dt: f32);
}
