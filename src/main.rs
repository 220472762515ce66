mod cli;
mod driver;

use std::error::Error;
use std::fs::File;
use std::sync::Arc;

use clap::Parser;
use grotto_runtime::{RuntimeConfig, Simulation, load_runtime_config};
use grotto_world::WorldGenParams;
use grotto_world::worldgen::load_params_from_path;
use hashbrown::HashMap;
use simplelog::{
    ColorChoice, CombinedLogger, Config, LevelFilter, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};

use crate::cli::Args;
use crate::driver::{CameraPath, DriverConfig, load_driver_config};

fn init_logging(args: &Args) -> Result<(), Box<dyn Error>> {
    if std::env::var_os("RUST_LOG").is_some() {
        env_logger::init();
        return Ok(());
    }
    let level = if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )];
    if let Some(path) = &args.log_file {
        loggers.push(WriteLogger::new(
            LevelFilter::Debug,
            Config::default(),
            File::create(path)?,
        ));
    }
    CombinedLogger::init(loggers)?;
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    init_logging(&args)?;

    let (params, runtime, driver) = match &args.config {
        Some(path) => {
            log::info!("loading config from {}", path.display());
            (
                load_params_from_path(path)?,
                load_runtime_config(path)?,
                load_driver_config(path)?,
            )
        }
        None => (
            WorldGenParams::default(),
            RuntimeConfig::default(),
            DriverConfig::default(),
        ),
    };
    log::info!(
        "map {}x{} chunks of {}x{}, seed {}",
        params.map.x_chunks,
        params.map.z_chunks,
        params.map.chunk_width_x,
        params.map.chunk_width_z,
        args.seed
    );

    let mut sim = Simulation::new(&params, runtime, args.seed);
    sim.populate()?;
    let path = CameraPath::new(&driver, sim.model());

    let mut peak: HashMap<Arc<str>, usize> = HashMap::new();
    let mut rescans = 0u32;
    for frame in 0..args.frames {
        let t = f64::from(frame) * driver.frame_ms / 1000.0;
        let (position, forward) = path.at(sim.model(), t);
        sim.set_camera(position, forward);
        if driver.net_every > 0 && frame % driver.net_every == 0 {
            sim.fire_net();
        }

        let out = sim.frame(driver.frame_ms)?;
        if out.scan.changed {
            rescans += 1;
        }
        for (tag, instances) in &out.instances {
            let n = peak.entry(tag.clone()).or_insert(0);
            *n = (*n).max(instances.len());
        }
        if driver.report_every > 0 && frame % driver.report_every == 0 {
            log::info!(
                "frame {frame}: {} active chunks ({} generated), {} nets, score {}",
                out.scan.chunks.len(),
                sim.scanner().texture().generated_count(),
                out.nets.len(),
                sim.score()
            );
        }
    }

    let mut tags: Vec<_> = peak.into_iter().collect();
    tags.sort();
    for (tag, n) in tags {
        log::debug!("{tag}: at most {n} visible instances");
    }
    log::info!(
        "done: {} frames, {} ticks, {} visibility changes, {} entities left, score {}, avg frame {:.2} ms",
        args.frames,
        sim.ticks(),
        rescans,
        sim.grid().len(),
        sim.score(),
        sim.average_frame_ms().unwrap_or(0.0)
    );
    Ok(())
}
