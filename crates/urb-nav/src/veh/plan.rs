//! The reserving vehicle planner.
//!
//! # How right-of-way works
//!
//! Each frame, every vehicle walks the route it predicts it will drive over
//! the next few seconds and stamps a reservation `{owner, tick, dist, time}`
//! into both *ways* (incoming sides) of every node it expects to cross.
//! Preference falls out of two comparisons:
//!
//! - **Same way, distance based.**  A slot is claimed when it is already
//!   owned, stale, or the claimant is strictly closer than the holder.  The
//!   vehicle ahead therefore keeps its lane forever; a follower sees a
//!   collision record pointing at it.
//! - **Cross way, time based.**  At a node with two incoming sides, the
//!   claimant must also beat the opposite side's holder on scaled arrival
//!   time.  A vehicle that passed a Yield sign carries a ×10 time penalty for
//!   the rest of the walk, so it loses every contested crossing.
//!
//! Reservations expire by epoch stamping (see [`NavContext`]); nothing is
//! ever cleared.  Losing plans get a [`Collision`] describing where, when,
//! and to whom they lost, which is all the behavior layer needs to brake,
//! queue, or wait out a red light.
//!
//! Plans are arena slots addressed by [`PlanId`]; reservations store the slot
//! plus a generation counter, so a recycled slot never resurrects a dead
//! vehicle's right-of-way.

use urb_core::{kmh_to_mps, mps_to_kmh, NodeId, PlanId, Point2, TurnBits};

use crate::context::NavContext;
use crate::veh::graph::{VehGraph, VehRoute, VehSign};

/// Halo weight applied while flooding forward along `next` links.
const HALO_WEIGHT_FORWARD: f32 = 0.001;
/// Halo weight applied along `prev` links; smaller than the forward weight so
/// backward marks never outrank forward reservations at the same node.
const HALO_WEIGHT_BACKWARD: f32 = 0.000_01;

// ── Query and result types ────────────────────────────────────────────────────

/// Per-tick planner input for one vehicle.
#[derive(Copy, Clone, Debug)]
pub struct PlanQuery {
    /// Vehicle position.
    pub x: f32,
    pub y: f32,
    /// Vehicle length; also the occupancy-halo radius.
    pub length: f32,
    /// Current speed in m/s (floored to 1 m/s for time estimates).
    pub speed: f32,
    /// Planning horizon in seconds.
    pub horizon: f32,
}

/// Description of the point where a plan lost preference.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Collision {
    /// The contested node.
    pub node: NodeId,
    /// The plan holding the node, or `None` when a red light is the blocker.
    pub plan: Option<PlanId>,
    /// Path distance from the vehicle to the contested node (metres).
    pub dist: f32,
    /// Unscaled arrival time at the contested node (seconds).
    pub time: f32,
    /// `true` when the blocker is on the vehicle's own way (someone ahead on
    /// the same lane, or a red light); `false` for a crossing conflict.
    pub my_way: bool,
    /// Signal type index when the blocker is a red light, 0 otherwise.
    pub semaphore: u8,
}

/// The planner's per-tick output.
#[derive(Copy, Clone, Debug)]
pub struct PlanStep {
    /// The node to steer toward; `NodeId::INVALID` when the route ended.
    pub target: NodeId,
    /// Where and to whom preference was lost, if anywhere within the walk.
    pub collision: Option<Collision>,
    /// Straightness of the walked stretch: `((span²)/(path length²))²`,
    /// 1.0 = straight line, → 0 = winding.
    pub curvature: f32,
    /// The plan's cached speed limit in m/s.
    pub speed_limit: f32,
}

// ── Internal state ────────────────────────────────────────────────────────────

/// One way of one node in the reservation table.
#[derive(Copy, Clone, Default)]
struct Reservation {
    owner:     PlanId,
    owner_gen: u32,
    /// Live while `tick >= NavContext::tick_epoch()`.
    tick: u32,
    dist: f32,
    time: f32,
}

/// Per-vehicle planning state in the arena.
struct PlanState {
    bits:            TurnBits,
    prev:            NodeId,
    curr:            NodeId,
    speed_limit_kmh: u8,
    /// Bumped on despawn; reservations quoting an older generation are dead.
    r#gen:   u32,
    alive: bool,
}

// ── VehNav ────────────────────────────────────────────────────────────────────

/// The vehicle navigator: graph + reservation table + plan arena.
///
/// Single-writer; all mutation happens from the orchestrator thread.  Within
/// one frame, the order in which vehicles are planned decides ties (strict
/// `<` comparisons mean the first writer keeps an equal-score slot), so the
/// caller must fix and document its iteration order.
pub struct VehNav {
    graph: VehGraph,
    /// Reservations per node, per incoming side.  Parallel to the node array.
    slots: Vec<[Reservation; 2]>,
    /// Traversal stamps per node, shared by halo marking and nearby walks.
    visited: Vec<u32>,
    visit_epoch: u32,
    plans: Vec<PlanState>,
    free:  Vec<PlanId>,
}

impl VehNav {
    pub fn new(graph: VehGraph) -> Self {
        let n = graph.node_count();
        Self {
            graph,
            slots: vec![[Reservation::default(); 2]; n],
            visited: vec![0; n],
            visit_epoch: 1,
            plans: Vec::new(),
            free: Vec::new(),
        }
    }

    #[inline]
    pub fn graph(&self) -> &VehGraph {
        &self.graph
    }

    // ── Plan lifecycle ────────────────────────────────────────────────────

    /// Allocate a plan.  It starts despawned; call [`respawn`](Self::respawn)
    /// to place it on the graph.
    pub fn create_plan(&mut self, seed: u32) -> PlanId {
        let bits = TurnBits::seed(seed);
        match self.free.pop() {
            Some(id) => {
                let plan = &mut self.plans[id.index()];
                plan.bits = bits;
                plan.prev = NodeId::INVALID;
                plan.curr = NodeId::INVALID;
                plan.speed_limit_kmh = 0;
                plan.alive = true;
                id
            }
            None => {
                self.plans.push(PlanState {
                    bits,
                    prev: NodeId::INVALID,
                    curr: NodeId::INVALID,
                    speed_limit_kmh: 0,
                    r#gen: 0,
                    alive: true,
                });
                PlanId(self.plans.len() as u32 - 1)
            }
        }
    }

    /// Release a plan slot.  Its outstanding reservations die with it: the
    /// generation bump makes them resolve to no owner.
    pub fn despawn(&mut self, id: PlanId) {
        let plan = &mut self.plans[id.index()];
        plan.alive = false;
        plan.prev = NodeId::INVALID;
        plan.curr = NodeId::INVALID;
        plan.r#gen = plan.r#gen.wrapping_add(1);
        self.free.push(id);
    }

    /// Place the plan on a spawn node and aim it at the node's successor.
    ///
    /// `spawn_index = None` draws the spawn slot from the plan's random word.
    /// `speed` initializes the cached speed limit.  Returns the spawn node.
    pub fn respawn(&mut self, id: PlanId, speed: f32, spawn_index: Option<u32>) -> NodeId {
        let index = spawn_index.unwrap_or_else(|| self.plans[id.index()].bits.word());
        let prev = self.graph.spawn_node(index);
        let curr = self.graph.node(prev).next[0];

        let plan = &mut self.plans[id.index()];
        plan.prev = prev;
        plan.curr = curr;
        plan.speed_limit_kmh = if speed > 70.0 { 255 } else { mps_to_kmh(speed) as u8 };
        prev
    }

    /// The node the plan is currently heading for (`INVALID` = despawned).
    #[inline]
    pub fn current(&self, id: PlanId) -> NodeId {
        self.plans[id.index()].curr
    }

    /// The node the plan last passed.
    #[inline]
    pub fn previous(&self, id: PlanId) -> NodeId {
        self.plans[id.index()].prev
    }

    /// The plan's cached speed limit in km/h.
    #[inline]
    pub fn speed_limit_kmh(&self, id: PlanId) -> u8 {
        self.plans[id.index()].speed_limit_kmh
    }

    /// Live reservation on `(node, way)` as `(owner, dist, time)`, if any.
    pub fn reservation(
        &self,
        node: NodeId,
        way: usize,
        ctx: &NavContext,
    ) -> Option<(PlanId, f32, f32)> {
        let slot = &self.slots[node.index()][way];
        if slot.tick >= ctx.tick_epoch() {
            self.resolve_owner(slot).map(|owner| (owner, slot.dist, slot.time))
        } else {
            None
        }
    }

    // ── Planify ───────────────────────────────────────────────────────────

    /// Walk the plan's predicted route, reserving nodes and collecting
    /// collision information.
    ///
    /// Returns `None` without touching anything when the plan is despawned
    /// (`curr == 0`).  Otherwise the walk runs until preference is lost or
    /// the time horizon is exceeded, then floods the occupancy halo around
    /// the vehicle.
    pub fn planify(&mut self, id: PlanId, q: &PlanQuery, ctx: &NavContext) -> Option<PlanStep> {
        let epoch = ctx.tick_epoch();
        let r#gen = self.plans[id.index()].r#gen;

        let (mut prev, mut curr) = {
            let plan = &self.plans[id.index()];
            debug_assert!(plan.alive, "planify on a despawned plan");
            if !plan.curr.is_valid() {
                return None;
            }
            (plan.prev, plan.curr)
        };

        let pos = Point2::new(q.x, q.y);
        let speed_inv = if q.speed < 1.0 { 1.0 } else { 1.0 / q.speed };

        let mut turn_count: u32 = 0;
        let mut target = curr;

        let mut node = *self.graph.node(curr);
        let prev_node = *self.graph.node(prev);
        let mut r = node.pos.xy().dist(pos);
        let mut t = r * speed_inv;

        debug_assert!(curr == prev_node.next[0] || curr == prev_node.next[1]);

        // Overpassed the current node?  Commit the advance on the first
        // iteration of the walk below.
        let to_curr = node.pos.xy().sub(pos);
        let along = node.pos.xy().sub(prev_node.pos.xy());
        let mut advance = r < q.length && to_curr.dot(along) < 0.0;

        let mut yield_factor = 1.0f32;
        let mut collision: Option<Collision> = None;

        // A Speed sign applies to the node the vehicle is already heading
        // for, before the walk starts.  Both approaches carry it.
        if node.from[0].sign == VehSign::Speed {
            debug_assert_eq!(node.from[1].sign, VehSign::Speed);
            self.plans[id.index()].speed_limit_kmh = node.semaphore;
        }

        loop {
            if !curr.is_valid() {
                break;
            }
            debug_assert_ne!(curr, prev);
            debug_assert!(prev == node.prev[0] || prev == node.prev[1]);
            let way = usize::from(prev == node.prev[1]);

            // Same-way slot: distance based.  The vehicle ahead keeps it.
            let slot = self.slots[curr.index()][way];
            let mut preference =
                self.slot_is_mine(&slot, id, r#gen) || slot.tick < epoch || r < slot.dist;
            let mut my_way = true;
            if preference {
                self.slots[curr.index()][way] = Reservation {
                    owner: id,
                    owner_gen: r#gen,
                    tick: epoch.wrapping_add(1),
                    dist: r,
                    time: t * yield_factor,
                };
                if node.prev[1].is_valid() {
                    // Cross slot: time based.  First to arrive wins; the
                    // cross slot itself is written by the other way's owner.
                    let cross = self.slots[curr.index()][way ^ 1];
                    preference = self.slot_is_mine(&cross, id, r#gen)
                        || cross.tick < epoch
                        || t * yield_factor < cross.time;
                    my_way = false;
                }
            }

            if !preference {
                let losing = self.slots[curr.index()][if my_way { way } else { way ^ 1 }];
                collision = Some(Collision {
                    node: curr,
                    plan: self.resolve_owner(&losing),
                    dist: r,
                    time: t,
                    my_way,
                    semaphore: 0,
                });
            }

            // Pre-baked routing chooses the egress side.
            let way_out = match node.from[way].route {
                VehRoute::None => {
                    debug_assert!(!node.next[0].is_valid() && !node.next[1].is_valid());
                    0
                }
                VehRoute::Left => {
                    debug_assert!(node.next[0].is_valid());
                    0
                }
                VehRoute::Right => {
                    debug_assert!(node.next[1].is_valid());
                    1
                }
                VehRoute::Any => {
                    debug_assert!(node.next[0].is_valid() && node.next[1].is_valid());
                    let dir = self.plans[id.index()].bits.direction(turn_count);
                    turn_count += 1;
                    dir.side()
                }
            };

            // Signs are baked on the side the route leaves through.
            match node.from[way_out].sign {
                VehSign::None | VehSign::Spawn => {}
                // Stop is not modelled separately; it degrades to Yield.
                VehSign::Yield | VehSign::Stop => yield_factor = 10.0,
                VehSign::Semaphore => {
                    debug_assert!(node.semaphore != 0);
                    if preference && !ctx.semaphores.is_green(node.semaphore) {
                        preference = false;
                        collision = Some(Collision {
                            node: curr,
                            plan: None,
                            dist: r,
                            time: t,
                            my_way: true,
                            semaphore: node.semaphore,
                        });
                    }
                }
                VehSign::Speed => {
                    debug_assert!(node.semaphore != 0);
                    let plan = &mut self.plans[id.index()];
                    if node.semaphore < plan.speed_limit_kmh {
                        plan.speed_limit_kmh = node.semaphore;
                    }
                }
            }

            prev = curr;
            curr = node.next[way_out];

            if r < q.length {
                target = curr;
            }

            if advance {
                // The overpassed node becomes `prev`; consume the turn bit if
                // the branch behind us was a fork.
                advance = false;
                let plan = &mut self.plans[id.index()];
                plan.prev = prev;
                plan.curr = curr;
                if turn_count > 0 {
                    debug_assert_eq!(turn_count, 1);
                    turn_count = 0;
                    plan.bits.turn();
                }
            }

            if !preference || t > q.horizon {
                break;
            }

            // Follow the path, accumulating distance and time.
            let prev_pos = node.pos.xy();
            node = *self.graph.node(curr);
            r += node.pos.xy().dist(prev_pos);
            t = r * speed_inv;
        }

        self.mark_own_nodes(id, r#gen, pos, q.length, epoch);

        // Straightness of the walked stretch, from the span/path-length ratio.
        let span_sq = node.pos.xy().dist_sq(pos);
        let mut curvature = span_sq / (r * r);
        curvature *= curvature;

        let speed_limit = kmh_to_mps(self.plans[id.index()].speed_limit_kmh as f32);

        Some(PlanStep { target, collision, curvature, speed_limit })
    }

    // ── Occupancy halo ────────────────────────────────────────────────────

    /// Flood reservations onto every node within `length` of the vehicle, in
    /// both directions along the graph, then claim the node under the vehicle
    /// unconditionally with `dist = time = 0`.
    fn mark_own_nodes(&mut self, id: PlanId, r#gen: u32, pos: Point2, length: f32, epoch: u32) {
        self.visit_epoch = self.visit_epoch.wrapping_add(1);
        let visit = self.visit_epoch;
        // Pre-mark the sentinel so "no link" indices are never expanded.
        self.visited[0] = visit;

        let length_sq = length * length;
        let start = self.plans[id.index()].prev;

        let mut stack: Vec<(NodeId, bool)> = Vec::with_capacity(16);
        stack.push((start, false));

        while let Some((curr, forward)) = stack.pop() {
            if self.visited[curr.index()] == visit {
                continue;
            }
            self.visited[curr.index()] = visit;

            let node = *self.graph.node(curr);
            let rr = node.pos.xy().dist_sq(pos);
            if rr > length_sq {
                continue;
            }

            let dist = rr * if forward { HALO_WEIGHT_FORWARD } else { HALO_WEIGHT_BACKWARD };
            let slot = self.slots[curr.index()][0];
            if self.slot_is_mine(&slot, id, r#gen) || slot.tick < epoch || dist < slot.dist {
                let res = Reservation {
                    owner: id,
                    owner_gen: r#gen,
                    tick: epoch.wrapping_add(1),
                    dist,
                    time: dist,
                };
                self.slots[curr.index()] = [res; 2];

                for i in (0..2).rev() {
                    let p = node.prev[i];
                    if self.visited[p.index()] != visit {
                        stack.push((p, false));
                    }
                }
                for i in (0..2).rev() {
                    let n = node.next[i];
                    if self.visited[n.index()] != visit {
                        stack.push((n, forward));
                    }
                }
            }
        }

        // The node under the vehicle is always its own.
        let prev = self.plans[id.index()].prev;
        let res = Reservation {
            owner: id,
            owner_gen: r#gen,
            tick: epoch.wrapping_add(1),
            dist: 0.0,
            time: 0.0,
        };
        self.slots[prev.index()] = [res; 2];
    }

    // ── Nearby ────────────────────────────────────────────────────────────

    /// Walk forward along the plan's route for `dist` metres, reporting every
    /// other plan whose vehicle is sitting exactly on a route node
    /// (reservation with `dist == 0`).  Each plan is reported at most once.
    pub fn nearby(
        &mut self,
        id: PlanId,
        dist: f32,
        ctx: &NavContext,
        mut visitor: impl FnMut(PlanId),
    ) {
        let epoch = ctx.tick_epoch();
        let start = self.plans[id.index()].curr;
        if !start.is_valid() {
            return;
        }

        self.visit_epoch = self.visit_epoch.wrapping_add(1);
        let visit = self.visit_epoch;

        let mut reported: Vec<PlanId> = Vec::new();
        let mut stack: Vec<(NodeId, NodeId, f32)> = vec![(start, NodeId::INVALID, dist)];

        while let Some((curr, prev, mut budget)) = stack.pop() {
            if self.visited[curr.index()] == visit {
                continue;
            }
            self.visited[curr.index()] = visit;

            let node = *self.graph.node(curr);
            if prev.is_valid() {
                budget -= node.pos.xy().dist(self.graph.node(prev).pos.xy());
            }

            for i in (0..2).rev() {
                let next = node.next[i];
                if !next.is_valid() || self.visited[next.index()] == visit {
                    continue;
                }
                for way in 0..2 {
                    let slot = self.slots[next.index()][way];
                    if slot.tick >= epoch && slot.dist == 0.0 {
                        if let Some(other) = self.resolve_owner(&slot) {
                            if other != id && !reported.contains(&other) {
                                reported.push(other);
                                visitor(other);
                            }
                        }
                    }
                }
                if budget > 0.0 {
                    stack.push((next, curr, budget));
                }
            }
        }
    }

    // ── Slot helpers ──────────────────────────────────────────────────────

    #[inline]
    fn slot_is_mine(&self, slot: &Reservation, id: PlanId, r#gen: u32) -> bool {
        slot.owner == id && slot.owner_gen == r#gen
    }

    /// The slot's owner if it still refers to a live plan of the recorded
    /// generation.
    fn resolve_owner(&self, slot: &Reservation) -> Option<PlanId> {
        let owner = slot.owner;
        if owner.is_valid() {
            let plan = &self.plans[owner.index()];
            if plan.alive && plan.r#gen == slot.owner_gen {
                return Some(owner);
            }
        }
        None
    }
}
