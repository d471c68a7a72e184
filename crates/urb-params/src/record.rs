//! The typed vehicle parameter record.

/// Everything the dynamics layer needs to build one vehicle model.
///
/// Units are SI throughout: metres, kilograms, newton-metres, radians,
/// rad/s.  Gear ratios are ordered first gear first.
#[derive(Clone, Debug, PartialEq)]
pub struct VehicleParams {
    pub name: String,

    // ── Chassis ───────────────────────────────────────────────────────────
    pub length_m: f32,
    pub width_m:  f32,
    pub height_m: f32,
    pub mass_kg:  f32,

    // ── Drivetrain ────────────────────────────────────────────────────────
    pub engine_peak_torque_nm: f32,
    /// Engine speed ceiling in rad/s.
    pub engine_max_omega: f32,
    /// Forward gear ratios, first gear first.
    pub gear_ratios: Vec<f32>,
    pub reverse_ratio: f32,
    pub final_drive_ratio: f32,

    // ── Wheels ────────────────────────────────────────────────────────────
    pub wheel_radius_m: f32,
    pub wheel_count: u8,
    /// Steering lock of the front axle in radians.
    pub max_steer_rad: f32,
    pub max_brake_torque_nm: f32,
}

impl VehicleParams {
    /// The built-in demo bus, usable without any parameter file.
    pub fn demo_bus() -> VehicleParams {
        VehicleParams {
            name: "Bus EMT".to_string(),
            length_m: 8.0,
            width_m: 2.6,
            height_m: 2.2,
            mass_kg: 11_500.0,
            engine_peak_torque_nm: 1_600.0,
            engine_max_omega: 320.0,
            gear_ratios: vec![3.8, 2.3, 1.5, 1.0],
            reverse_ratio: 4.1,
            final_drive_ratio: 5.6,
            wheel_radius_m: 0.48,
            wheel_count: 6,
            max_steer_rad: 0.55,
            max_brake_torque_nm: 28_000.0,
        }
    }
}
