//! `urb-params` — the vehicle parameter database.
//!
//! The dynamics façade builds chassis and drivetrains from typed records
//! keyed by vehicle name.  Production data is maintained in a spreadsheet
//! and exported to CSV; this crate owns the CSV schema and the lookup table.
//!
//! # CSV format
//!
//! One row per vehicle model.  `gear_ratios` packs the forward gears into a
//! single `/`-separated field, highest (first gear) ratio first:
//!
//! ```csv
//! name,length_m,width_m,height_m,mass_kg,engine_peak_torque_nm,engine_max_omega,gear_ratios,reverse_ratio,final_drive_ratio,wheel_radius_m,wheel_count,max_steer_rad,max_brake_torque_nm
//! Bus EMT,8.0,2.6,2.2,11500,1600,320,3.8/2.3/1.5/1.0,4.1,5.6,0.48,6,0.55,28000
//! ```

pub mod db;
pub mod error;
pub mod record;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use db::ParamsDb;
pub use error::{ParamsError, ParamsResult};
pub use record::VehicleParams;
