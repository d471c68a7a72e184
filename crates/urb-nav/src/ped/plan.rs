//! The pedestrian planner.
//!
//! Far simpler than the vehicle side: no reservations, no preference.  A
//! pedestrian walks toward its target node and, on arrival, picks a neighbor
//! — deterministically when there is no real choice, otherwise at random
//! with a probability proportional to how far "in front" each neighbor lies.

use urb_core::{NodeId, Point2, TurnBits};

use crate::ped::graph::{PedGraph, PedNode};

/// Per-pedestrian planning state.
///
/// Stateless selection: the graph is passed into every call, so plans are
/// plain values that can live inside whatever agent struct owns them.
#[derive(Clone, Debug)]
pub struct PedPlan {
    pub bits: TurnBits,
    pub curr: NodeId,
    pub prev: NodeId,
}

impl PedPlan {
    pub fn new(seed: u32) -> Self {
        Self {
            bits: TurnBits::seed(seed),
            curr: NodeId::INVALID,
            prev: NodeId::INVALID,
        }
    }

    /// Place the plan on a spawn node.  Returns that node.
    pub fn respawn(&mut self, graph: &PedGraph, spawn_index: u32) -> NodeId {
        self.curr = graph.spawn_node(spawn_index);
        self.prev = self.curr;
        self.curr
    }

    /// Advance the plan for a pedestrian at `(x, y)` facing `ang` (radians).
    ///
    /// While the pedestrian is farther than `arrival_distance` from its
    /// target, the target is kept.  Within that distance a successor is
    /// selected and `prev`/`curr` advance.  Returns the (possibly new)
    /// target node, or `None` once the plan has run off the graph.
    pub fn planify(
        &mut self,
        graph: &PedGraph,
        x: f32,
        y: f32,
        ang: f32,
        arrival_distance: f32,
    ) -> Option<NodeId> {
        if !self.curr.is_valid() {
            return None;
        }

        let node = graph.node(self.curr);
        if node.pos.xy().dist_sq(Point2::new(x, y)) < arrival_distance * arrival_distance {
            let next = self.choose_next(ang, node);
            self.prev = self.curr;
            self.curr = next;
        }

        if self.curr.is_valid() { Some(self.curr) } else { None }
    }

    /// Re-route using the reversed heading — the escape maneuver for a
    /// pedestrian stuck against an unreachable target.
    pub fn re_planify(&mut self, graph: &PedGraph, ang: f32) -> Option<NodeId> {
        if !self.curr.is_valid() {
            return None;
        }

        let next = self.choose_next(ang + std::f32::consts::PI, graph.node(self.curr));
        if next.is_valid() {
            self.prev = self.curr;
            self.curr = next;
        }
        Some(self.curr)
    }

    /// Select one of the node's adjacencies.
    ///
    /// The reference direction is the *reverse* of the heading, quantized to
    /// a byte, so a larger wrapped angular difference means "more in front"
    /// and earns a proportionally larger weight.
    fn choose_next(&mut self, ang: f32, node: &PedNode) -> NodeId {
        let ang256 = (128.0 + 256.0 * ang / std::f32::consts::TAU) as i32 & 0xFF;

        match node.count {
            1 => node.na[0].next,

            // Two neighbors: no U-turn unless forced.
            2 => {
                let first = node.na[0].next;
                if first == self.prev { node.na[1].next } else { first }
            }

            // Three or four: angle-weighted random choice.
            3 | 4 => {
                let count = node.count as usize;
                let mut probs = [0i32; 4];
                let mut sum = 0i32;
                for k in 0..count {
                    let diff = (ang256 - node.na[k].ang as i32).abs();
                    probs[k] = if diff > 128 { 256 - diff } else { diff };
                    sum += probs[k];
                }
                if sum == 0 {
                    return node.na[0].next;
                }

                let mut r = (self.bits.next_word() % sum as u32) as i32;
                for k in 0..count {
                    r -= probs[k];
                    if r <= 0 {
                        return node.na[k].next;
                    }
                }
                unreachable!("weighted choice must land on a neighbor");
            }

            _ => {
                debug_assert!(false, "invalid neighbor count {}", node.count);
                NodeId::INVALID
            }
        }
    }
}
