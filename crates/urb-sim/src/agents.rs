//! Ambient agent state and per-tick behaviors.
//!
//! Behaviors are free functions over explicitly borrowed simulation fields
//! so the tick loop can hand out disjoint mutable borrows.  Every behavior
//! follows the same shape: spatial query (collect first), planner call,
//! speed/steer application, world re-registration.

use rustc_hash::FxHashMap;

use urb_core::{kmh_to_mps, EntityId, Point2, Point3, SimRng};
use urb_nav::{NavContext, PedGraph, PedPlan, PedSign, PlanQuery, VehNav};
use urb_world::World;

// ── Behavior constants ────────────────────────────────────────────────────────

pub const VEH_WIDTH_MIN: f32 = 1.8;
pub const VEH_WIDTH_MAX: f32 = 2.2;
pub const VEH_LENGTH_MIN: f32 = 4.5;
pub const VEH_LENGTH_MAX: f32 = 4.8;
/// Neighborhood radius for behavioral queries.
pub const VEH_ENVIRONMENT_RADIUS: f32 = 20.0;
/// Ambient cruise / respawn speed: 40 km/h.
pub fn veh_speed_respawn() -> f32 {
    kmh_to_mps(40.0)
}
pub const VEH_ACCEL_MAX: f32 = 2.0;
pub const VEH_ACCEL_MIN: f32 = -1.1 * VEH_ACCEL_MAX;
/// Planner lookahead horizon, seconds.
pub const VEH_PLAN_HORIZON: f32 = 4.0;
/// Gain from gap distance to approach speed when closing in on a conflict.
const VEH_GAP_SPEED_GAIN: f32 = 0.5;

pub const PED_RADIUS_MIN: f32 = 0.30;
pub const PED_RADIUS_MAX: f32 = 0.40;
pub const PED_HEIGHT_MIN: f32 = 1.50;
pub const PED_HEIGHT_MAX: f32 = 1.90;
pub const PED_SPEED_MIN: f32 = 0.75;
pub const PED_SPEED_MAX: f32 = 1.25;
/// Pedestrian angular speed cap, rad/s.
pub const PED_WSPEED_MAX: f32 = 2.00;
/// Speed scale while the target crossing shows green / red.
pub const PED_SPEED_MULT_GREEN: f32 = 1.25;
pub const PED_SPEED_MULT_RED: f32 = 1.75;
/// Arrival distance per unit of body radius: a pedestrian commits to its
/// next node once within this multiple of its own radius.
pub const PED_ARRIVAL_RADIUS_SCALE: f32 = 1.5;
/// Seconds without progress before a stuck pedestrian re-plans.
const PED_STUCK_SECS: f32 = 5.0;

// ── Shared helpers ────────────────────────────────────────────────────────────

/// Signed angular distance from `b` to `a`, wrapped into `(-π, π]`.
pub fn angle_diff(a: f32, b: f32) -> f32 {
    use std::f32::consts::PI;
    let mut c = a - b;
    while c > PI {
        c -= 2.0 * PI;
    }
    while c < -PI {
        c += 2.0 * PI;
    }
    c
}

/// Re-register an entity under its new position, keeping the position map in
/// sync with the grid.
pub fn place(
    world: &mut World,
    positions: &mut FxHashMap<EntityId, Point2>,
    entity: EntityId,
    pos: Point2,
) {
    world.update(entity, pos.x, pos.y);
    positions.insert(entity, pos);
}

// ── Ambient vehicle ───────────────────────────────────────────────────────────

pub struct AmbientVehicle {
    pub entity: EntityId,
    pub plan:   urb_core::PlanId,
    pub pos:     Point2,
    pub heading: f32,
    pub speed:   f32,
    pub length: f32,
    pub width:  f32,
}

/// One behavioral tick of an ambient vehicle.
pub fn update_vehicle(
    v: &mut AmbientVehicle,
    nav: &mut VehNav,
    ctx: &NavContext,
    world: &mut World,
    positions: &mut FxHashMap<EntityId, Point2>,
    dt: f32,
) {
    let query = PlanQuery {
        x: v.pos.x,
        y: v.pos.y,
        length: v.length,
        speed: v.speed,
        horizon: VEH_PLAN_HORIZON,
    };
    let step = match nav.planify(v.plan, &query, ctx) {
        Some(step) if step.target.is_valid() => step,
        // Route ended (or plan dead): recycle onto a fresh spawn node.
        _ => {
            respawn_vehicle(v, nav, world, positions);
            return;
        }
    };

    // Spatial pass: anything inside the corridor ahead forces an emergency
    // stop.  Positions are only read here; movement happens below.
    let forward = Point2::new(v.heading.cos(), v.heading.sin());
    let blocked = world
        .query_around(v.pos, VEH_ENVIRONMENT_RADIUS)
        .filter(|&e| e != v.entity)
        .any(|e| {
            let Some(&p) = positions.get(&e) else { return false };
            let rel = p.sub(v.pos);
            let ahead = rel.dot(forward);
            let lateral = (rel.y * forward.x - rel.x * forward.y).abs();
            ahead > 0.0 && ahead < 2.0 * v.length && lateral < v.width
        });

    // Desired speed: the cached limit, eased down in curves and toward any
    // conflict point.
    let curvature = if step.curvature.is_finite() {
        step.curvature.clamp(0.0, 1.0)
    } else {
        1.0
    };
    let mut desired = step.speed_limit * (0.5 + 0.5 * curvature);
    if let Some(conflict) = step.collision {
        desired = desired.min((conflict.dist - v.length).max(0.0) * VEH_GAP_SPEED_GAIN);
    }
    if blocked {
        desired = 0.0;
    }

    let accel = ((desired - v.speed) / dt.max(1e-3)).clamp(VEH_ACCEL_MIN, VEH_ACCEL_MAX);
    v.speed = (v.speed + accel * dt).max(0.0);

    // Steer straight at the target node.
    let target_pos = nav.graph().node(step.target).pos.xy();
    let to_target = target_pos.sub(v.pos);
    if to_target.dot(to_target) > 1e-6 {
        v.heading = to_target.angle();
    }
    v.pos.x += v.speed * v.heading.cos() * dt;
    v.pos.y += v.speed * v.heading.sin() * dt;

    place(world, positions, v.entity, v.pos);
}

/// Recycle a vehicle onto a spawn node drawn from its plan's random word.
pub fn respawn_vehicle(
    v: &mut AmbientVehicle,
    nav: &mut VehNav,
    world: &mut World,
    positions: &mut FxHashMap<EntityId, Point2>,
) {
    let spawn = nav.respawn(v.plan, veh_speed_respawn(), None);
    let spawn_pos = nav.graph().node(spawn).pos.xy();
    let curr = nav.current(v.plan);
    v.pos = spawn_pos;
    v.speed = veh_speed_respawn();
    if curr.is_valid() {
        v.heading = nav.graph().node(curr).pos.xy().sub(spawn_pos).angle();
    }
    place(world, positions, v.entity, v.pos);
}

// ── Pedestrian ────────────────────────────────────────────────────────────────

pub struct Pedestrian {
    pub entity: EntityId,
    pub plan:   PedPlan,
    pub rng:    SimRng,
    pub pos:     Point2,
    pub heading: f32,
    /// Unscaled walking speed drawn at spawn.
    pub base_speed: f32,
    pub radius: f32,
    pub height: f32,
    /// Progress watchdog: distance to target last tick + stall time.
    pub last_target_dist: f32,
    pub stuck_secs: f32,
}

/// One behavioral tick of a pedestrian.
pub fn update_pedestrian(
    p: &mut Pedestrian,
    graph: &PedGraph,
    ctx: &NavContext,
    world: &mut World,
    positions: &mut FxHashMap<EntityId, Point2>,
    dt: f32,
) {
    let arrival_distance = PED_ARRIVAL_RADIUS_SCALE * p.radius;
    let target = match p
        .plan
        .planify(graph, p.pos.x, p.pos.y, p.heading, arrival_distance)
    {
        Some(node) => node,
        None => {
            respawn_pedestrian(p, graph, world, positions);
            return;
        }
    };
    let node = graph.node(target);

    // Crossing pacing: hurry on green, rush on red.
    let mut speed = p.base_speed;
    if node.sign == PedSign::Semaphore && node.semaphore != 0 {
        speed *= if ctx.semaphores.is_green(node.semaphore) {
            PED_SPEED_MULT_GREEN
        } else {
            PED_SPEED_MULT_RED
        };
    }

    // Crowding: slow down among nearby bodies.
    let crowded = world
        .query_around(p.pos, 2.0)
        .filter(|&e| e != p.entity)
        .any(|e| {
            positions
                .get(&e)
                .is_some_and(|other| other.dist_sq(p.pos) < (3.0 * p.radius).powi(2))
        });
    if crowded {
        speed *= 0.5;
    }

    // Turn toward the target under the angular speed cap, then walk.
    let target_pos = node.pos.xy();
    let to_target = target_pos.sub(p.pos);
    if to_target.dot(to_target) > 1e-6 {
        let turn = angle_diff(to_target.angle(), p.heading);
        let max_turn = PED_WSPEED_MAX * dt;
        p.heading += turn.clamp(-max_turn, max_turn);
    }
    p.pos.x += speed * p.heading.cos() * dt;
    p.pos.y += speed * p.heading.sin() * dt;

    // Watchdog: a pedestrian that stops closing on its target for long
    // enough re-plans with the reversed heading.
    let target_dist = p.pos.dist(target_pos);
    if target_dist < p.last_target_dist - 1e-3 {
        p.stuck_secs = 0.0;
    } else {
        p.stuck_secs += dt;
        if p.stuck_secs > PED_STUCK_SECS {
            p.plan.re_planify(graph, p.heading);
            p.stuck_secs = 0.0;
        }
    }
    p.last_target_dist = target_dist;

    place(world, positions, p.entity, p.pos);
}

/// Recycle a pedestrian onto a random spawn node.
pub fn respawn_pedestrian(
    p: &mut Pedestrian,
    graph: &PedGraph,
    world: &mut World,
    positions: &mut FxHashMap<EntityId, Point2>,
) {
    let spawn = p.plan.respawn(graph, p.rng.gen_range(0..graph.spawn_count()));
    p.pos = graph.node(spawn).pos.xy();
    p.heading = p.rng.gen_range(-std::f32::consts::PI..std::f32::consts::PI);
    p.stuck_secs = 0.0;
    p.last_target_dist = f32::MAX;
    place(world, positions, p.entity, p.pos);
}

// ── Static obstacle ───────────────────────────────────────────────────────────

pub struct Obstacle {
    pub entity: EntityId,
    pub pos:    Point3,
}
