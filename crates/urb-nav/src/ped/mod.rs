//! Pedestrian navigation: the undirected sidewalk graph and its planner.

pub mod graph;
pub mod plan;

pub use graph::{PedAdjacency, PedGraph, PedGraphBuilder, PedNode, PedSign};
pub use plan::PedPlan;
