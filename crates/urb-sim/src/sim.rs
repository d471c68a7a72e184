//! The `Sim` struct and its per-frame step.

use rustc_hash::FxHashMap;

use urb_core::{EntityId, Point2, VehicleId};
use urb_dynamics::{Frame, VehicleDynamics, GEAR_NEUTRAL};
use urb_nav::{NavContext, PedGraph, VehNav};
use urb_world::World;

use crate::agents::{update_pedestrian, update_vehicle, AmbientVehicle, Obstacle, Pedestrian};
use crate::observer::SimObserver;
use crate::{SimConfig, SimResult};

// ── Frame I/O ─────────────────────────────────────────────────────────────────

/// One frame's worth of host input.
#[derive(Copy, Clone, Debug, Default)]
pub struct StepInputs {
    /// Steering in `[-1, 1]`.
    pub steer: f32,
    /// Throttle in `[0, 1]`.
    pub accel: f32,
    /// Brake in `[0, 1]`; values under 0.01 snap to 0.
    pub brake: f32,
    /// Handbrake in `[0, 1]`; values under 0.01 snap to 0.
    pub handbrake: f32,
    /// Frame time in seconds (negative values clamp to 0).
    pub dt: f32,
}

impl StepInputs {
    /// Clamp every channel into its contract range.
    pub fn clamped(self) -> StepInputs {
        let dead = |v: f32| if v < 0.01 { 0.0 } else { v.min(1.0) };
        StepInputs {
            steer: self.steer.clamp(-1.0, 1.0),
            accel: self.accel.clamp(0.0, 1.0),
            brake: dead(self.brake),
            handbrake: dead(self.handbrake),
            dt: self.dt.max(0.0),
        }
    }
}

/// The bus snapshot published to the host after each frame.
#[derive(Clone, Debug, Default)]
pub struct StepOutputs {
    /// `false` when the simulation asks the host to stop stepping.
    pub running: bool,
    /// Body-frame linear velocity, m/s.
    pub lin_vel: urb_core::Point3,
    /// Body-frame angular velocity, rad/s.
    pub ang_vel: urb_core::Point3,
    /// Body-frame linear acceleration, m/s².
    pub lin_accel: urb_core::Point3,
    pub gear_current: u32,
    pub gear_target:  u32,
    /// Engine speed, rad/s.
    pub engine_speed: f32,
    /// Per-wheel angular speed, at most 8 entries.
    pub wheel_speeds: Vec<f32>,
}

// ── Bus ───────────────────────────────────────────────────────────────────────

/// The player-controlled bus: a dynamics handle plus its world registration.
pub(crate) struct Bus {
    pub entity:  EntityId,
    pub vehicle: VehicleId,
}

// ── Sim ───────────────────────────────────────────────────────────────────────

/// The simulation: world, navigators, dynamics, and agent populations.
///
/// Create via [`SimBuilder`][crate::SimBuilder]; drive with [`step`](Self::step).
pub struct Sim<D: VehicleDynamics> {
    pub config: SimConfig,

    /// Spatial hash of every dynamic entity.
    pub world: World,

    /// Per-run clock/epoch state (signal table + frame epoch).
    pub ctx: NavContext,

    /// Vehicle navigator; `None` runs a bus-only simulation.
    pub veh_nav: Option<VehNav>,

    /// Pedestrian graph; `None` disables pedestrians.
    pub ped_graph: Option<PedGraph>,

    /// The wheeled-vehicle engine behind the façade.
    pub dynamics: D,

    pub(crate) bus: Bus,
    pub(crate) vehicles: Vec<AmbientVehicle>,
    pub(crate) pedestrians: Vec<Pedestrian>,
    pub(crate) objects: Vec<Obstacle>,

    /// Last known ground position of every world entity.
    pub(crate) positions: FxHashMap<EntityId, Point2>,

    frame: u64,
}

impl<D: VehicleDynamics> Sim<D> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn assemble(
        config: SimConfig,
        world: World,
        ctx: NavContext,
        veh_nav: Option<VehNav>,
        ped_graph: Option<PedGraph>,
        dynamics: D,
        bus: Bus,
        vehicles: Vec<AmbientVehicle>,
        pedestrians: Vec<Pedestrian>,
        objects: Vec<Obstacle>,
        positions: FxHashMap<EntityId, Point2>,
    ) -> Self {
        Self {
            config,
            world,
            ctx,
            veh_nav,
            ped_graph,
            dynamics,
            bus,
            vehicles,
            pedestrians,
            objects,
            positions,
            frame: 0,
        }
    }

    /// Frames stepped so far.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Number of live ambient vehicles.
    pub fn vehicle_count(&self) -> usize {
        self.vehicles.len()
    }

    pub fn pedestrian_count(&self) -> usize {
        self.pedestrians.len()
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Position of a static obstacle (creation order).
    pub fn object_pos(&self, index: usize) -> urb_core::Point3 {
        self.objects[index].pos
    }

    /// Ground position of an ambient vehicle (creation order).
    pub fn vehicle_pos(&self, index: usize) -> Point2 {
        self.vehicles[index].pos
    }

    pub fn pedestrian_pos(&self, index: usize) -> Point2 {
        self.pedestrians[index].pos
    }

    /// Advance the simulation one frame.
    pub fn step(&mut self, inputs: &StepInputs) -> SimResult<StepOutputs> {
        self.step_observed(inputs, &mut crate::NoopObserver)
    }

    /// Advance one frame with observer hooks.
    pub fn step_observed<O: SimObserver>(
        &mut self,
        inputs: &StepInputs,
        observer: &mut O,
    ) -> SimResult<StepOutputs> {
        observer.on_step_start(self.frame);
        let inputs = inputs.clamped();
        let dt = inputs.dt;

        // ── Phase 1: feed the bus, integrate physics ──────────────────────
        self.dynamics.action_mode(self.bus.vehicle, true, false);
        self.dynamics.action_autobox(self.bus.vehicle, true);
        self.dynamics.action_steer(self.bus.vehicle, inputs.steer);
        self.dynamics.action_accel(self.bus.vehicle, inputs.accel);
        self.dynamics.action_brake(self.bus.vehicle, inputs.brake);
        self.dynamics.action_handbrake(self.bus.vehicle, inputs.handbrake);
        self.dynamics.action_gear(self.bus.vehicle, GEAR_NEUTRAL + 1, true);
        self.dynamics.update(dt);

        // ── Phase 2: advance the shared clock and epoch ───────────────────
        self.ctx.advance_frame(dt);

        // ── Phase 3: agents, in the tie-breaking order ────────────────────
        //
        // Bus first (the player steers it; only its world registration
        // moves), then ambient vehicles in creation order, then pedestrians.
        let bus_pose = self.dynamics.pose_twist_accel(self.bus.vehicle, Frame::World);
        crate::agents::place(
            &mut self.world,
            &mut self.positions,
            self.bus.entity,
            bus_pose.pos.xy(),
        );

        if dt > 0.0 {
            if let Some(nav) = self.veh_nav.as_mut() {
                for vehicle in &mut self.vehicles {
                    update_vehicle(
                        vehicle,
                        nav,
                        &self.ctx,
                        &mut self.world,
                        &mut self.positions,
                        dt,
                    );
                }
            }
            if let Some(graph) = self.ped_graph.as_ref() {
                for pedestrian in &mut self.pedestrians {
                    update_pedestrian(
                        pedestrian,
                        graph,
                        &self.ctx,
                        &mut self.world,
                        &mut self.positions,
                        dt,
                    );
                }
            }
        }

        // ── Phase 4: publish the bus snapshot ─────────────────────────────
        let body = self.dynamics.pose_twist_accel(self.bus.vehicle, Frame::Body);
        let gearbox = self.dynamics.transmission(self.bus.vehicle);
        let outputs = StepOutputs {
            running: true,
            lin_vel: body.lin_vel,
            ang_vel: body.ang_vel,
            lin_accel: body.lin_accel,
            gear_current: gearbox.gear_current,
            gear_target: gearbox.gear_target,
            engine_speed: gearbox.engine_speed,
            wheel_speeds: gearbox.wheel_speeds,
        };

        self.frame += 1;
        observer.on_step_end(self.frame, &outputs);
        Ok(outputs)
    }
}
