//! `urb-nav` — navigation graphs and planners for the `urbsim` framework.
//!
//! # What lives here
//!
//! | Module        | Contents                                                   |
//! |---------------|------------------------------------------------------------|
//! | [`semaphore`] | `SemaphoreTable` — up to 256 phase-locked signal types     |
//! | [`context`]   | `NavContext` — the per-run clock/epoch state               |
//! | [`veh`]       | Directed vehicle graph, binary loader, `VehNav` planner    |
//! | [`ped`]       | Undirected sidewalk graph, loader, `PedPlan` planner       |
//! | [`error`]     | `NavError`, `NavResult`                                    |
//!
//! # Design
//!
//! The planners are cooperative, not adversarial: every vehicle writes its
//! predicted route into a reservation table that parallels the graph, and
//! right-of-way falls out of simple slot comparisons (smaller distance wins on
//! the same lane, smaller scaled arrival time wins on a crossing).  Stale
//! reservations are never erased — they expire by epoch stamping, which makes
//! a full-table reset each frame unnecessary.
//!
//! All per-run mutable counters (the signal clock, the frame epoch) live in
//! [`NavContext`], owned by the orchestrator and passed explicitly into
//! planner calls.  There is no global state.

pub mod context;
pub mod error;
pub mod ped;
pub mod semaphore;
pub mod veh;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use context::NavContext;
pub use error::{NavError, NavResult};
pub use ped::{PedAdjacency, PedGraph, PedGraphBuilder, PedNode, PedPlan, PedSign};
pub use semaphore::{SemaphoreTable, MAX_SEMAPHORES};
pub use veh::{
    Approach, Collision, PlanQuery, PlanStep, VehGraph, VehGraphBuilder, VehNav, VehNode,
    VehRoute, VehSign,
};
