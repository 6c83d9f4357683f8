//! EPPIC command-line front end.
//!
//! `eppic <config_path>` runs the configured simulation to its end time,
//! writing `data.h5` and `log/log.log` under `out/<id>/` in the current
//! directory, where `<id>` is derived from the process start time.

use std::env;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{SystemTime, UNIX_EPOCH};

use log::{error, info};

use eppic::config::Config;
use eppic::fdtd::Simulation;
use eppic::output::H5Sink;

/// Run identifier derived from the process start time.
fn run_id() -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    format!("{}{:03}", now.as_secs(), now.subsec_millis())
}

/// Route the `log` facade to `log.log` inside the run directory.
fn init_logging(log_dir: &Path) -> std::io::Result<()> {
    let file = File::create(log_dir.join("log.log"))?;
    env_logger::builder()
        .filter_level(log::LevelFilter::max())
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

fn try_main() -> Result<(), String> {
    let mut args = env::args();
    let program = args.next().unwrap_or_else(|| "eppic".into());
    let config_path = match (args.next(), args.next()) {
        (Some(path), None) => path,
        _ => return Err(format!("usage: {program} <config_path>")),
    };

    let id = run_id();
    let run_dir = PathBuf::from("out").join(&id);
    let log_dir = run_dir.join("log");
    fs::create_dir_all(&log_dir).map_err(|err| format!("create {}: {err}", log_dir.display()))?;
    init_logging(&log_dir).map_err(|err| format!("logger: {err}"))?;
    info!("run id: {id}");

    let config = Config::from_file(Path::new(&config_path)).map_err(|err| err.to_string())?;
    let sink = H5Sink::create(&run_dir.join("data.h5")).map_err(|err| err.to_string())?;

    let mut simulation = Simulation::new(&config, sink).map_err(|err| err.to_string())?;
    simulation.run().map_err(|err| err.to_string())?;
    Ok(())
}

fn main() -> ExitCode {
    match try_main() {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            // the logger may not be initialized yet; stderr always gets the line
            error!("{message}");
            eprintln!("eppic: {message}");
            ExitCode::FAILURE
        }
    }
}
