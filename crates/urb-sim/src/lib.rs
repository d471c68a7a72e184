//! `urb-sim` — the frame orchestrator for the `urbsim` framework.
//!
//! # The tick
//!
//! One call to [`Sim::step`] is one frame:
//!
//! 1. Clamp the host's input vector and hand it to the bus's dynamics.
//! 2. `dynamics.update(dt)` — the wheeled-vehicle engine integrates once.
//! 3. `NavContext::advance_frame(dt)` — signal clock + reservation epoch.
//! 4. Agents plan in a fixed order: the bus (world re-registration; the
//!    player drives it), then ambient vehicles in creation order, then
//!    pedestrians.  Each agent queries the spatial world, runs its planner,
//!    and applies speed/steer.
//! 5. Publish the bus's pose/twist/transmission snapshot to the host.
//!
//! The order in (4) is load-bearing: planner ties break toward the first
//! writer within a frame.
//!
//! | Module       | Contents                                              |
//! |--------------|-------------------------------------------------------|
//! | [`config`]   | `SimConfig`, `BusConfig`                              |
//! | [`sim`]      | `Sim`, `StepInputs`, `StepOutputs`                    |
//! | [`agents`]   | ambient vehicle/pedestrian/obstacle behaviors         |
//! | [`builder`]  | `SimBuilder`                                          |
//! | [`observer`] | `SimObserver`, `NoopObserver`                         |
//! | [`driver`]   | mode-dispatched external entry point (`Driver`)       |
//! | [`error`]    | `SimError`, `SimResult`                               |

pub mod agents;
pub mod builder;
pub mod config;
pub mod driver;
pub mod error;
pub mod observer;
pub mod sim;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use builder::SimBuilder;
pub use config::{BusConfig, SimConfig};
pub use driver::{Driver, DriverInputs, InputTrace, Mode};
pub use error::{SimError, SimResult};
pub use observer::{NoopObserver, SimObserver};
pub use sim::{Sim, StepInputs, StepOutputs};
