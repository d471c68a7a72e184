//! Vehicle navigation: the directed road graph and the reserving planner.

pub mod graph;
pub mod plan;

pub use graph::{Approach, VehGraph, VehGraphBuilder, VehNode, VehRoute, VehSign};
pub use plan::{Collision, PlanQuery, PlanStep, VehNav};
