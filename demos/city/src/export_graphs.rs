//! Export the demo scene to the on-disk formats.
//!
//! Writes `nav_veh_graph.dat`, `nav_ped_graph.dat`, and `nav_sem_times.txt`
//! into the directory given as the first argument (default `data/`), so the
//! loaders can be exercised against real files.

mod scene;

use std::io::Write;
use std::path::PathBuf;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let out: PathBuf = std::env::args().nth(1).unwrap_or_else(|| "data".into()).into();
    std::fs::create_dir_all(&out)?;

    let veh_path = out.join("nav_veh_graph.dat");
    scene::vehicle_graph()?.save_path(&veh_path)?;
    println!("wrote {}", veh_path.display());

    let ped_path = out.join("nav_ped_graph.dat");
    scene::pedestrian_graph()?.save_path(&ped_path)?;
    println!("wrote {}", ped_path.display());

    // Validate the timings before exporting them.
    scene::semaphores()?;
    let sem_path = out.join("nav_sem_times.txt");
    let mut file = std::fs::File::create(&sem_path)?;
    writeln!(file, "# idx total green phase")?;
    writeln!(file, "{} 30 12 0", scene::JUNCTION_SIGNAL)?;
    println!("wrote {}", sem_path.display());

    Ok(())
}
