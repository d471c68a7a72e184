//! Fluent builder for constructing a [`Sim`].

use rustc_hash::FxHashMap;

use urb_core::SimRng;
use urb_dynamics::VehicleDynamics;
use urb_nav::{NavContext, PedGraph, SemaphoreTable, VehGraph, VehNav};
use urb_world::{EntityKind, World};

use crate::agents::{
    self, AmbientVehicle, Obstacle, Pedestrian, PED_HEIGHT_MAX, PED_HEIGHT_MIN, PED_RADIUS_MAX,
    PED_RADIUS_MIN, PED_SPEED_MAX, PED_SPEED_MIN, VEH_LENGTH_MAX, VEH_LENGTH_MIN, VEH_WIDTH_MAX,
    VEH_WIDTH_MIN,
};
use crate::sim::Bus;
use crate::{Sim, SimConfig, SimError, SimResult};

/// Fluent builder for [`Sim<D>`].
///
/// # Required inputs
///
/// - [`SimConfig`] — counts, seed, bus setup
/// - `D: VehicleDynamics` — the physics engine behind the façade
///
/// # Optional inputs
///
/// | Method                 | Default                              |
/// |------------------------|--------------------------------------|
/// | `.vehicle_graph(g)`    | none (ambient vehicles disabled)     |
/// | `.pedestrian_graph(g)` | none (pedestrians disabled)          |
/// | `.semaphores(t)`       | all signal types always green        |
///
/// # Example
///
/// ```rust,ignore
/// let sim = SimBuilder::new(config, KinematicDynamics::new(ParamsDb::builtin()))
///     .vehicle_graph(VehGraph::load_path(&veh_path)?)
///     .pedestrian_graph(PedGraph::load_path(&ped_path)?)
///     .semaphores(semaphores)
///     .build()?;
/// ```
pub struct SimBuilder<D: VehicleDynamics> {
    config:     SimConfig,
    dynamics:   D,
    veh_graph:  Option<VehGraph>,
    ped_graph:  Option<PedGraph>,
    semaphores: Option<SemaphoreTable>,
}

impl<D: VehicleDynamics> SimBuilder<D> {
    pub fn new(config: SimConfig, dynamics: D) -> Self {
        Self {
            config,
            dynamics,
            veh_graph: None,
            ped_graph: None,
            semaphores: None,
        }
    }

    /// Supply the vehicle navigation graph.  Required when
    /// `config.num_vehicles > 0`.
    pub fn vehicle_graph(mut self, graph: VehGraph) -> Self {
        self.veh_graph = Some(graph);
        self
    }

    /// Supply the pedestrian navigation graph.  Required when
    /// `config.num_pedestrians > 0`.
    pub fn pedestrian_graph(mut self, graph: PedGraph) -> Self {
        self.ped_graph = Some(graph);
        self
    }

    /// Supply a configured signal table.  Without it every signal type reads
    /// green.
    pub fn semaphores(mut self, table: SemaphoreTable) -> Self {
        self.semaphores = Some(table);
        self
    }

    /// Validate inputs, spawn the populations, and return a ready [`Sim`].
    pub fn build(mut self) -> SimResult<Sim<D>> {
        let config = &self.config;

        // ── Validate graph availability against the populations ───────────
        if config.num_vehicles > 0 {
            match &self.veh_graph {
                None => {
                    return Err(SimError::Config(
                        "ambient vehicles need a vehicle graph".to_string(),
                    ));
                }
                Some(g) if g.spawn_count() == 0 => {
                    return Err(SimError::Config(
                        "vehicle graph has no spawn nodes".to_string(),
                    ));
                }
                _ => {}
            }
        }
        if config.num_pedestrians > 0 {
            match &self.ped_graph {
                None => {
                    return Err(SimError::Config(
                        "pedestrians need a pedestrian graph".to_string(),
                    ));
                }
                Some(g) if g.spawn_count() == 0 => {
                    return Err(SimError::Config(
                        "pedestrian graph has no spawn nodes".to_string(),
                    ));
                }
                _ => {}
            }
        }

        let ctx = NavContext::new(self.semaphores.take().unwrap_or_default());
        let mut world = World::new();
        let mut positions = FxHashMap::default();

        // ── Bus ───────────────────────────────────────────────────────────
        let vehicle = self.dynamics.create(&config.bus.vehicle_name)?;
        self.dynamics
            .set_position_direction(vehicle, config.bus.spawn_pos, config.bus.spawn_dir);
        let bus_entity = world.spawn(EntityKind::Bus);
        agents::place(&mut world, &mut positions, bus_entity, config.bus.spawn_pos.xy());
        let bus = Bus { entity: bus_entity, vehicle };

        // ── Ambient vehicles ──────────────────────────────────────────────
        let mut veh_nav = self.veh_graph.map(VehNav::new);
        let mut vehicles = Vec::with_capacity(config.num_vehicles);
        if let Some(nav) = veh_nav.as_mut() {
            for i in 0..config.num_vehicles {
                let mut rng = SimRng::for_slot(config.seed, i as u32);
                let entity = world.spawn(EntityKind::Vehicle);
                let plan = nav.create_plan(rng.random());
                let mut vehicle = AmbientVehicle {
                    entity,
                    plan,
                    pos: urb_core::Point2::default(),
                    heading: 0.0,
                    speed: 0.0,
                    length: rng.gen_range(VEH_LENGTH_MIN..VEH_LENGTH_MAX),
                    width: rng.gen_range(VEH_WIDTH_MIN..VEH_WIDTH_MAX),
                };
                agents::respawn_vehicle(&mut vehicle, nav, &mut world, &mut positions);
                vehicles.push(vehicle);
            }
        }

        // ── Pedestrians ───────────────────────────────────────────────────
        let mut pedestrians = Vec::with_capacity(config.num_pedestrians);
        if let Some(graph) = self.ped_graph.as_ref() {
            for i in 0..config.num_pedestrians {
                let mut rng = SimRng::for_slot(config.seed ^ 0x5045_4445, i as u32);
                let entity = world.spawn(EntityKind::Pedestrian);
                let mut pedestrian = Pedestrian {
                    entity,
                    plan: urb_nav::PedPlan::new(rng.random()),
                    pos: urb_core::Point2::default(),
                    heading: 0.0,
                    base_speed: rng.gen_range(PED_SPEED_MIN..PED_SPEED_MAX),
                    radius: rng.gen_range(PED_RADIUS_MIN..PED_RADIUS_MAX),
                    height: rng.gen_range(PED_HEIGHT_MIN..PED_HEIGHT_MAX),
                    last_target_dist: f32::MAX,
                    stuck_secs: 0.0,
                    rng,
                };
                agents::respawn_pedestrian(&mut pedestrian, graph, &mut world, &mut positions);
                pedestrians.push(pedestrian);
            }
        }

        // ── Static obstacles ──────────────────────────────────────────────
        let objects: Vec<Obstacle> = config
            .objects
            .iter()
            .map(|&pos| {
                let entity = world.spawn(EntityKind::Object);
                agents::place(&mut world, &mut positions, entity, pos.xy());
                Obstacle { entity, pos }
            })
            .collect();

        Ok(Sim::assemble(
            self.config,
            world,
            ctx,
            veh_nav,
            self.ped_graph,
            self.dynamics,
            bus,
            vehicles,
            pedestrians,
            objects,
            positions,
        ))
    }
}
