//! Drive the demo city block for ten simulated seconds.
//!
//! The bus gets full throttle for the first half of the run and coasts for
//! the second, while ambient traffic and pedestrians circulate on the ring.
//! Telemetry is printed once per simulated second.

mod scene;

use urb_core::{Point2, Point3};
use urb_dynamics::KinematicDynamics;
use urb_params::ParamsDb;
use urb_sim::{Driver, InputTrace, SimBuilder, SimConfig};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mut config = SimConfig {
        seed: 7,
        num_vehicles: 12,
        num_pedestrians: 20,
        ..SimConfig::default()
    };
    // Park the bus on the south straight, pointing east.
    config.bus.spawn_pos = Point3::new(20.0, -8.0, 0.15);
    config.bus.spawn_dir = Point2::new(1.0, 0.0);

    let mut driver = Driver::new(move || {
        Ok(SimBuilder::new(
            config.clone(),
            KinematicDynamics::new(ParamsDb::builtin()),
        )
        .vehicle_graph(scene::vehicle_graph()?)
        .pedestrian_graph(scene::pedestrian_graph()?)
        .semaphores(scene::semaphores()?)
        .build()?)
    });

    let rate = 100.0;
    let seconds = 10.0;
    let steps = (seconds * rate) as usize;
    let trace = InputTrace {
        accel: vec![1.0; steps / 2],
        seconds,
        rate,
        ..InputTrace::default()
    };

    log::info!("stepping {steps} frames at {rate} Hz");
    let outputs = driver.run(&trace)?;

    for (i, out) in outputs.iter().enumerate().step_by(rate as usize) {
        println!(
            "t={:>4.1}s  v={:>5.2} m/s  gear={}  engine={:>5.1} rad/s",
            i as f32 / rate,
            out.lin_vel.x,
            out.gear_current,
            out.engine_speed,
        );
    }
    let last = outputs.last().expect("at least one frame");
    println!("final: v={:.2} m/s after {} frames", last.lin_vel.x, outputs.len());

    Ok(())
}
