//! CSV-backed parameter lookup table.

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use crate::{ParamsError, ParamsResult, VehicleParams};

// ── CSV record ────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct ParamsRecord {
    name:                  String,
    length_m:              f32,
    width_m:               f32,
    height_m:              f32,
    mass_kg:               f32,
    engine_peak_torque_nm: f32,
    engine_max_omega:      f32,
    /// `/`-separated forward gear ratios, e.g. `3.8/2.3/1.5/1.0`.
    gear_ratios:           String,
    reverse_ratio:         f32,
    final_drive_ratio:     f32,
    wheel_radius_m:        f32,
    wheel_count:           u8,
    max_steer_rad:         f32,
    max_brake_torque_nm:   f32,
}

// ── ParamsDb ──────────────────────────────────────────────────────────────────

/// Vehicle parameter records keyed by name.
#[derive(Default)]
pub struct ParamsDb {
    records: HashMap<String, VehicleParams>,
}

impl ParamsDb {
    pub fn new() -> Self {
        Self::default()
    }

    /// A database holding only the built-in demo bus, so the simulator runs
    /// without any external file.
    pub fn builtin() -> Self {
        let mut db = Self::new();
        db.insert(VehicleParams::demo_bus());
        db
    }

    /// Load records from a CSV file, merging into the existing table.
    /// A repeated name replaces the earlier record with a warning.
    pub fn load_csv(&mut self, path: &Path) -> ParamsResult<()> {
        let file = std::fs::File::open(path).map_err(ParamsError::Io)?;
        self.load_reader(file)
    }

    /// Like [`load_csv`](Self::load_csv) but accepts any `Read` source.
    pub fn load_reader<R: Read>(&mut self, reader: R) -> ParamsResult<()> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        for result in csv_reader.deserialize::<ParamsRecord>() {
            let row = result.map_err(|e| ParamsError::Parse(e.to_string()))?;
            let params = convert(row)?;
            self.insert(params);
        }
        Ok(())
    }

    pub fn insert(&mut self, params: VehicleParams) {
        if self.records.contains_key(&params.name) {
            log::warn!("vehicle parameters {:?} redefined; last record wins", params.name);
        }
        self.records.insert(params.name.clone(), params);
    }

    /// Look up a vehicle model by name.
    pub fn get(&self, name: &str) -> Option<&VehicleParams> {
        self.records.get(name)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn convert(row: ParamsRecord) -> ParamsResult<VehicleParams> {
    let gear_ratios = row
        .gear_ratios
        .split('/')
        .map(|tok| {
            tok.trim().parse::<f32>().map_err(|_| {
                ParamsError::Parse(format!(
                    "record {:?}: invalid gear ratio {tok:?}",
                    row.name
                ))
            })
        })
        .collect::<ParamsResult<Vec<f32>>>()?;

    let params = VehicleParams {
        name: row.name,
        length_m: row.length_m,
        width_m: row.width_m,
        height_m: row.height_m,
        mass_kg: row.mass_kg,
        engine_peak_torque_nm: row.engine_peak_torque_nm,
        engine_max_omega: row.engine_max_omega,
        gear_ratios,
        reverse_ratio: row.reverse_ratio,
        final_drive_ratio: row.final_drive_ratio,
        wheel_radius_m: row.wheel_radius_m,
        wheel_count: row.wheel_count,
        max_steer_rad: row.max_steer_rad,
        max_brake_torque_nm: row.max_brake_torque_nm,
    };

    check_positive(&params, "mass_kg", params.mass_kg)?;
    check_positive(&params, "length_m", params.length_m)?;
    check_positive(&params, "wheel_radius_m", params.wheel_radius_m)?;
    check_positive(&params, "engine_max_omega", params.engine_max_omega)?;
    if params.gear_ratios.is_empty() {
        return Err(ParamsError::Parse(format!(
            "record {:?}: no gear ratios",
            params.name
        )));
    }
    Ok(params)
}

fn check_positive(params: &VehicleParams, field: &'static str, value: f32) -> ParamsResult<()> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(ParamsError::BadValue { name: params.name.clone(), field, value })
    }
}
