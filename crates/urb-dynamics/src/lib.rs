//! `urb-dynamics` — the wheeled-vehicle physics façade.
//!
//! # Seam design
//!
//! The simulator core drives vehicles exclusively through the
//! [`VehicleDynamics`] trait: create/destroy, pose placement, pose/twist/
//! acceleration queries, transmission queries, per-tick action setters, and
//! one `update(dt)` that flushes inputs and steps the solver.  Binding a
//! rigid-body engine (suspension raycasts, clutch, tire model) means
//! implementing this one trait; nothing else in the workspace changes.
//!
//! The built-in [`KinematicDynamics`] is the reference implementation: a
//! longitudinal force model through the drivetrain, kinematic-bicycle
//! steering, and a simple autobox.  It keeps the orchestrator and the tests
//! honest without carrying a physics dependency.
//!
//! | Module        | Contents                                            |
//! |---------------|-----------------------------------------------------|
//! | [`facade`]    | `VehicleDynamics` trait                             |
//! | [`types`]     | `Frame`, `PoseTwistAccel`, `Transmission`, gears    |
//! | [`kinematic`] | `KinematicDynamics` reference engine                |
//! | [`raycast`]   | batched suspension ground queries (≤ 32 per batch)  |
//! | [`error`]     | `DynamicsError`, `DynResult`                        |

pub mod error;
pub mod facade;
pub mod kinematic;
pub mod raycast;
pub mod types;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::{DynResult, DynamicsError};
pub use facade::VehicleDynamics;
pub use kinematic::KinematicDynamics;
pub use types::{Frame, PoseTwistAccel, Transmission, GEAR_NEUTRAL, GEAR_REVERSE};
