//! Top-level simulation configuration.

use urb_core::{Point2, Point3};

/// Player-bus setup.
#[derive(Clone, Debug)]
pub struct BusConfig {
    /// Parameter-database record to build the bus from.
    pub vehicle_name: String,
    pub spawn_pos: Point3,
    /// Initial heading; a zero vector keeps the engine default.
    pub spawn_dir: Point2,
    /// Chassis footprint used for world registration.
    pub length: f32,
    pub width:  f32,
    pub height: f32,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            vehicle_name: "Bus EMT".to_string(),
            spawn_pos: Point3::new(0.0, 0.0, 0.15),
            spawn_dir: Point2::new(0.0, 0.0),
            length: 8.0,
            width:  2.6,
            height: 2.2,
        }
    }
}

/// Top-level simulation configuration.
///
/// Typically assembled by the application crate (optionally from a config
/// file) and passed to [`SimBuilder`][crate::SimBuilder].
#[derive(Clone, Debug)]
pub struct SimConfig {
    /// Master RNG seed.  The same seed always produces identical ambient
    /// populations and identical runs.
    pub seed: u64,

    /// Ambient vehicle count.  Requires a vehicle graph with spawn nodes.
    pub num_vehicles: usize,

    /// Ambient pedestrian count.  Requires a pedestrian graph with spawns.
    pub num_pedestrians: usize,

    /// Static obstacle positions.
    pub objects: Vec<Point3>,

    pub bus: BusConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 1,
            num_vehicles: 0,
            num_pedestrians: 0,
            objects: Vec::new(),
            bus: BusConfig::default(),
        }
    }
}
