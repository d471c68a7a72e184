//! The synthetic city block shared by the demo binaries.
//!
//! One rectangular one-way ring road (counter-clockwise) with a signalled
//! junction and a 30 km/h stretch, plus a sidewalk loop around the block
//! whose street crossing shares the junction's signal type.

use urb_core::Point3;
use urb_nav::{
    NavResult, PedGraph, PedGraphBuilder, PedSign, SemaphoreTable, VehGraph, VehGraphBuilder,
    VehRoute, VehSign,
};

/// Signal type shared by the junction and the pedestrian crossing.
pub const JUNCTION_SIGNAL: u8 = 1;

/// Ring-road corners and midpoints of a 100 m × 60 m block.
const RING: [(f32, f32); 8] = [
    (0.0, 0.0),
    (50.0, 0.0),
    (100.0, 0.0),
    (100.0, 30.0),
    (100.0, 60.0),
    (50.0, 60.0),
    (0.0, 60.0),
    (0.0, 30.0),
];

pub fn vehicle_graph() -> NavResult<VehGraph> {
    let mut b = VehGraphBuilder::new();
    let nodes: Vec<_> = RING
        .iter()
        .map(|&(x, y)| b.add_node(Point3::new(x, y, 0.0)))
        .collect();

    for i in 0..nodes.len() {
        b.connect(nodes[i], nodes[(i + 1) % nodes.len()])?;
    }
    for &node in &nodes {
        b.set_route(node, 0, VehRoute::Left);
    }

    // Signalled junction at the east midpoint.
    b.set_sign(nodes[3], 0, VehSign::Semaphore);
    b.set_semaphore(nodes[3], JUNCTION_SIGNAL);

    // 30 km/h stretch entering the north side.
    b.set_sign(nodes[5], 0, VehSign::Speed);
    b.set_sign(nodes[5], 1, VehSign::Speed);
    b.set_semaphore(nodes[5], 30);

    // Every ring node doubles as a spawn point.
    b.set_spawn_count(nodes.len() as u32);
    b.build()
}

pub fn pedestrian_graph() -> NavResult<PedGraph> {
    let mut b = PedGraphBuilder::new();
    let corners = [
        (-5.0, -5.0),
        (105.0, -5.0),
        (105.0, 65.0),
        (-5.0, 65.0),
    ];
    let nodes: Vec<_> = corners
        .iter()
        .map(|&(x, y)| b.add_node(Point3::new(x, y, 0.0)))
        .collect();

    for i in 0..nodes.len() {
        b.connect(nodes[i], nodes[(i + 1) % nodes.len()])?;
    }

    // Street crossing on the east sidewalk, phase-locked to the junction.
    let crossing = b.add_node(Point3::new(105.0, 30.0, 0.0));
    b.connect(nodes[1], crossing)?;
    b.connect(crossing, nodes[2])?;
    b.set_sign(crossing, PedSign::Semaphore, JUNCTION_SIGNAL);

    b.set_spawn_count(4);
    b.build()
}

pub fn semaphores() -> NavResult<SemaphoreTable> {
    let mut table = SemaphoreTable::new();
    table.configure(JUNCTION_SIGNAL as usize, 30, 12, 0)?;
    Ok(table)
}
