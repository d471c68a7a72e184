//! `urb-world` — sparse cell-grid spatial hash for the `urbsim` framework.
//!
//! # Design
//!
//! The world plane is divided into square cells of [`CELL_SIZE`] metres.
//! Every dynamic entity (the bus, ambient vehicles, pedestrians, street
//! furniture) registers its position each frame; the grid keeps it filed in
//! the cell covering that position.  Behavioral code then asks "who is near
//! me?" with [`World::query_around`] and touches only the 4–9 cells that
//! intersect the query — O(1) in the total entity count.
//!
//! Cells are singly linked lists threaded through the entity slab; the sparse
//! grid itself is a hash map from packed cell coordinates to the list head.
//! Empty cells are absent from the map.
//!
//! | Module      | Contents                                   |
//! |-------------|--------------------------------------------|
//! | [`entity`]  | `EntityKind`                               |
//! | [`grid`]    | `World`, `Nearby` iterator, `CELL_SIZE`    |

pub mod entity;
pub mod grid;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use entity::EntityKind;
pub use grid::{Nearby, World, CELL_SIZE};
