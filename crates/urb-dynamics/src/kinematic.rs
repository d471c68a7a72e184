//! The built-in kinematic reference engine.
//!
//! A deliberately small model with the right *shape*: drive force comes from
//! engine torque through the gear train, steering is a kinematic bicycle,
//! and the autobox shifts on engine-speed thresholds.  Suspension is a
//! batched ground query that pins ride height — enough to exercise every
//! façade contract without a rigid-body dependency.

use urb_core::{Point2, Point3, VehicleId};
use urb_params::{ParamsDb, VehicleParams};

use crate::raycast::{batch_ground_heights, SuspensionRay};
use crate::types::yaw_quat;
use crate::{
    DynResult, DynamicsError, Frame, PoseTwistAccel, Transmission, VehicleDynamics, GEAR_NEUTRAL,
    GEAR_REVERSE,
};

/// Engine speed floor (idle), rad/s.
const IDLE_OMEGA: f32 = 60.0;
/// Autobox upshift / downshift thresholds as fractions of max engine speed.
const UPSHIFT_FRACTION: f32 = 0.85;
const DOWNSHIFT_FRACTION: f32 = 0.30;
/// Rolling-resistance deceleration, m/s².
const ROLLING_DECEL: f32 = 0.35;
/// Handbrake deceleration, m/s².
const HANDBRAKE_DECEL: f32 = 6.0;

// ── Per-vehicle state ─────────────────────────────────────────────────────────

#[derive(Copy, Clone)]
struct Controls {
    steer:     f32,
    accel:     f32,
    brake:     f32,
    handbrake: f32,
    analog:    bool,
    smoothing: bool,
}

impl Default for Controls {
    /// Analog mode until a host says otherwise.
    fn default() -> Self {
        Self {
            steer: 0.0,
            accel: 0.0,
            brake: 0.0,
            handbrake: 0.0,
            analog: true,
            smoothing: false,
        }
    }
}

struct VehicleSlot {
    params: VehicleParams,
    alive:  bool,

    pos:      Point3,
    yaw:      f32,
    speed:    f32,
    yaw_rate: f32,
    /// Body-frame linear acceleration from the last non-zero-dt step.
    lin_accel: Point3,
    /// Low-pass state for smoothed steering input.
    steer_state: f32,

    gear_current: u32,
    gear_target:  u32,
    engine_omega: f32,
    autobox:      bool,

    controls: Controls,
}

impl VehicleSlot {
    fn new(params: VehicleParams) -> Self {
        Self {
            params,
            alive: true,
            pos: Point3::default(),
            yaw: 0.0,
            speed: 0.0,
            yaw_rate: 0.0,
            lin_accel: Point3::default(),
            steer_state: 0.0,
            gear_current: GEAR_NEUTRAL + 1,
            gear_target: GEAR_NEUTRAL + 1,
            engine_omega: IDLE_OMEGA,
            autobox: true,
            controls: Controls::default(),
        }
    }

    /// Ratio of the given gear slot, signed for reverse, 0 for neutral.
    fn gear_ratio(&self, gear: u32) -> f32 {
        match gear {
            GEAR_REVERSE => -self.params.reverse_ratio,
            GEAR_NEUTRAL => 0.0,
            forward => {
                let index = (forward - GEAR_NEUTRAL - 1) as usize;
                self.params.gear_ratios.get(index).copied().unwrap_or(0.0)
            }
        }
    }

    fn top_gear(&self) -> u32 {
        GEAR_NEUTRAL + self.params.gear_ratios.len() as u32
    }
}

// ── KinematicDynamics ─────────────────────────────────────────────────────────

/// The reference [`VehicleDynamics`] implementation.
pub struct KinematicDynamics {
    db:    ParamsDb,
    slots: Vec<VehicleSlot>,
    free:  Vec<VehicleId>,
}

impl KinematicDynamics {
    pub fn new(db: ParamsDb) -> Self {
        Self { db, slots: Vec::new(), free: Vec::new() }
    }

    fn slot(&self, id: VehicleId) -> &VehicleSlot {
        let slot = &self.slots[id.index()];
        debug_assert!(slot.alive, "use of dead vehicle handle {id}");
        slot
    }

    fn slot_mut(&mut self, id: VehicleId) -> &mut VehicleSlot {
        let slot = &mut self.slots[id.index()];
        debug_assert!(slot.alive, "use of dead vehicle handle {id}");
        slot
    }

    fn step_vehicle(slot: &mut VehicleSlot, dt: f32) {
        let params = &slot.params;
        let controls = slot.controls;

        // ── Autobox ───────────────────────────────────────────────────────
        if slot.autobox && slot.gear_current > GEAR_NEUTRAL {
            if slot.engine_omega > UPSHIFT_FRACTION * params.engine_max_omega
                && slot.gear_current < slot.top_gear()
            {
                slot.gear_target = slot.gear_current + 1;
            } else if slot.engine_omega < DOWNSHIFT_FRACTION * params.engine_max_omega
                && slot.gear_current > GEAR_NEUTRAL + 1
            {
                slot.gear_target = slot.gear_current - 1;
            }
        }
        slot.gear_current = slot.gear_target;

        // ── Longitudinal force balance ────────────────────────────────────
        let ratio = slot.gear_ratio(slot.gear_current) * params.final_drive_ratio;
        // Rev limiter: no drive torque at the engine ceiling.
        let drive_force = if slot.engine_omega >= params.engine_max_omega {
            0.0
        } else {
            params.engine_peak_torque_nm * ratio * controls.accel / params.wheel_radius_m
        };

        let brake_decel = params.max_brake_torque_nm * controls.brake
            / (params.wheel_radius_m * params.mass_kg)
            + HANDBRAKE_DECEL * controls.handbrake;

        let old_speed = slot.speed;
        let mut speed = old_speed + drive_force / params.mass_kg * dt;

        // Braking and rolling resistance oppose motion and never reverse it.
        let resist = (brake_decel + ROLLING_DECEL) * dt;
        if speed > 0.0 {
            speed = (speed - resist).max(0.0);
        } else {
            speed = (speed + resist).min(0.0);
        }
        slot.speed = speed;

        // ── Kinematic bicycle ─────────────────────────────────────────────
        //
        // Digital mode quantizes the stick to {-1, 0, 1}; smoothing runs the
        // input through a first-order filter.
        let raw_steer = if controls.analog {
            controls.steer
        } else if controls.steer > 0.5 {
            1.0
        } else if controls.steer < -0.5 {
            -1.0
        } else {
            0.0
        };
        let steer = if controls.smoothing {
            slot.steer_state + (raw_steer - slot.steer_state) * (4.0 * dt).min(1.0)
        } else {
            raw_steer
        };
        slot.steer_state = steer;

        let steer_angle = steer * params.max_steer_rad;
        let wheelbase = 0.6 * params.length_m;
        slot.yaw_rate = speed * steer_angle.tan() / wheelbase;
        slot.yaw += slot.yaw_rate * dt;

        slot.pos.x += speed * slot.yaw.cos() * dt;
        slot.pos.y += speed * slot.yaw.sin() * dt;

        // ── Engine speed ──────────────────────────────────────────────────
        let wheel_omega = speed.abs() / params.wheel_radius_m;
        slot.engine_omega = (wheel_omega * ratio.abs())
            .clamp(IDLE_OMEGA, params.engine_max_omega);

        // ── Finite-difference acceleration (body frame) ───────────────────
        slot.lin_accel = Point3::new((speed - old_speed) / dt, 0.0, 0.0);
    }
}

impl VehicleDynamics for KinematicDynamics {
    fn create(&mut self, vehicle_name: &str) -> DynResult<VehicleId> {
        let params = self
            .db
            .get(vehicle_name)
            .ok_or_else(|| DynamicsError::UnknownVehicle(vehicle_name.to_string()))?
            .clone();

        let slot = VehicleSlot::new(params);
        Ok(match self.free.pop() {
            Some(id) => {
                self.slots[id.index()] = slot;
                id
            }
            None => {
                self.slots.push(slot);
                VehicleId(self.slots.len() as u32 - 1)
            }
        })
    }

    fn destroy(&mut self, id: VehicleId) {
        self.slots[id.index()].alive = false;
        self.free.push(id);
    }

    fn set_position_direction(&mut self, id: VehicleId, pos: Point3, dir: Point2) {
        let slot = self.slot_mut(id);
        slot.pos = pos;
        if dir.x != 0.0 || dir.y != 0.0 {
            slot.yaw = dir.angle();
        }
        slot.speed = 0.0;
        slot.yaw_rate = 0.0;
        slot.lin_accel = Point3::default();
    }

    fn pose_twist_accel(&self, id: VehicleId, frame: Frame) -> PoseTwistAccel {
        let slot = self.slot(id);
        let ang_vel = Point3::new(0.0, 0.0, slot.yaw_rate);
        let (lin_vel, lin_accel) = match frame {
            Frame::Body => (Point3::new(slot.speed, 0.0, 0.0), slot.lin_accel),
            Frame::World => {
                let (sin, cos) = slot.yaw.sin_cos();
                (
                    Point3::new(slot.speed * cos, slot.speed * sin, 0.0),
                    Point3::new(
                        slot.lin_accel.x * cos - slot.lin_accel.y * sin,
                        slot.lin_accel.x * sin + slot.lin_accel.y * cos,
                        slot.lin_accel.z,
                    ),
                )
            }
        };
        PoseTwistAccel {
            pos: slot.pos,
            ori: yaw_quat(slot.yaw),
            lin_vel,
            ang_vel,
            lin_accel,
        }
    }

    fn transmission(&self, id: VehicleId) -> Transmission {
        let slot = self.slot(id);
        let wheel_omega = slot.speed / slot.params.wheel_radius_m;
        let wheels = (slot.params.wheel_count as usize).min(8);
        Transmission {
            gear_current: slot.gear_current,
            gear_target:  slot.gear_target,
            gear_ratio:   slot.gear_ratio(slot.gear_current),
            engine_speed: slot.engine_omega,
            wheel_speeds: vec![wheel_omega; wheels],
        }
    }

    fn action_mode(&mut self, id: VehicleId, analog: bool, smoothing: bool) {
        let controls = &mut self.slot_mut(id).controls;
        controls.analog = analog;
        controls.smoothing = smoothing;
    }

    fn action_steer(&mut self, id: VehicleId, value: f32) {
        self.slot_mut(id).controls.steer = value.clamp(-1.0, 1.0);
    }

    fn action_accel(&mut self, id: VehicleId, value: f32) {
        self.slot_mut(id).controls.accel = value.clamp(0.0, 1.0);
    }

    fn action_brake(&mut self, id: VehicleId, value: f32) {
        self.slot_mut(id).controls.brake = value.clamp(0.0, 1.0);
    }

    fn action_handbrake(&mut self, id: VehicleId, value: f32) {
        self.slot_mut(id).controls.handbrake = value.clamp(0.0, 1.0);
    }

    fn action_gear(&mut self, id: VehicleId, gear: u32, target: bool) {
        let slot = self.slot_mut(id);
        let gear = gear.min(slot.top_gear());
        // With the autobox engaged, forward-to-forward target requests belong
        // to the box; hosts may still force reverse/neutral or hard-set gears.
        if target && slot.autobox && slot.gear_current > GEAR_NEUTRAL && gear > GEAR_NEUTRAL {
            return;
        }
        slot.gear_target = gear;
        if !target {
            slot.gear_current = gear;
        }
    }

    fn action_autobox(&mut self, id: VehicleId, enable: bool) {
        self.slot_mut(id).autobox = enable;
    }

    fn update(&mut self, dt: f32) {
        // Stale-dt updates must leave the finite-difference state readable.
        if dt <= 0.0 {
            if dt < 0.0 {
                log::warn!("dynamics update with negative dt {dt} ignored");
            }
            return;
        }

        // Suspension pass: one shared batched query for all live vehicles.
        let rays: Vec<SuspensionRay> = self
            .slots
            .iter()
            .filter(|s| s.alive)
            .map(|s| SuspensionRay { origin: s.pos })
            .collect();
        let heights = batch_ground_heights(&rays);

        let mut ray_index = 0;
        for slot in self.slots.iter_mut().filter(|s| s.alive) {
            Self::step_vehicle(slot, dt);
            slot.pos.z = heights[ray_index] + slot.params.wheel_radius_m;
            ray_index += 1;
        }
    }
}
