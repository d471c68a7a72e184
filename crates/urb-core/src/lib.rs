//! `urb-core` — foundational types for the `urbsim` traffic framework.
//!
//! This crate is a dependency of every other `urb-*` crate.  It intentionally
//! has no `urb-*` dependencies and minimal external ones (only `rand` and
//! `thiserror`, plus optional `serde`).
//!
//! # What lives here
//!
//! | Module          | Contents                                              |
//! |-----------------|-------------------------------------------------------|
//! | [`ids`]         | `NodeId`, `PlanId`, `EntityId`, `VehicleId`           |
//! | [`geo`]         | `Point2`, `Point3`, planar distance helpers           |
//! | [`rng`]         | `TurnBits` (per-plan branch word), `SimRng` (global)  |
//! | [`units`]       | km/h ↔ m/s conversions                                |
//! | [`error`]       | `UrbError`, `UrbResult`                               |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.        |

pub mod error;
pub mod geo;
pub mod ids;
pub mod rng;
pub mod units;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::{UrbError, UrbResult};
pub use geo::{Point2, Point3};
pub use ids::{EntityId, NodeId, PlanId, VehicleId};
pub use rng::{SimRng, Turn, TurnBits};
pub use units::{kmh_to_mps, mps_to_kmh};
