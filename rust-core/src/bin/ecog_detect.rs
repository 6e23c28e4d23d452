//! Batch spike detection over a CSV acquisition
//!
//! Usage: ecog_detect <recording.csv> [--config workbench.yaml] [--output-dir DIR]

use std::path::PathBuf;
use std::process::ExitCode;

use ecog_workbench::config::{load_config, WorkbenchConfig};
use ecog_workbench::detection::ExportOutcome;
use ecog_workbench::ingest::read_csv_acquisition;
use ecog_workbench::workbench::{Workbench, SANDBOX_WORKSPACE};
use ecog_workbench::{Result, Selection, WorkbenchError};

struct Args {
    input: PathBuf,
    config: Option<PathBuf>,
    output_dir: Option<PathBuf>,
}

fn parse_args() -> Result<Args> {
    let mut input = None;
    let mut config = None;
    let mut output_dir = None;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" | "-c" => config = args.next().map(PathBuf::from),
            "--output-dir" | "-o" => output_dir = args.next().map(PathBuf::from),
            other if other.starts_with('-') => {
                return Err(WorkbenchError::InvalidParameter(format!("unknown option '{}'", other)))
            }
            other => input = Some(PathBuf::from(other)),
        }
    }

    let input = input.ok_or_else(|| {
        WorkbenchError::InvalidParameter(
            "usage: ecog_detect <recording.csv> [--config FILE] [--output-dir DIR]".to_string(),
        )
    })?;
    Ok(Args {
        input,
        config,
        output_dir,
    })
}

fn run(args: Args, mut config: WorkbenchConfig) -> Result<()> {
    if let Some(dir) = args.output_dir {
        config.export.enabled = true;
        config.export.directory = dir;
    }

    let acquisition = read_csv_acquisition(&args.input)?;
    let mut workbench = Workbench::new(config)?;
    let signal = workbench.open_acquisition(&acquisition)?;
    let channels = acquisition.resolved_channel_names()?;

    let selection = Selection::new().with(SANDBOX_WORKSPACE, &signal, &channels);
    let mut last = 0u8;
    let report = workbench.detect_spikes(&selection, None, &mut |percent: u8| {
        if percent / 10 > last / 10 {
            log::debug!("detection {}%", percent);
        }
        last = percent;
    })?;

    for (channel, rate) in report.channels.iter().zip(&report.rates) {
        log::info!("{}: {} spike windows", channel, rate);
    }
    match report.export {
        ExportOutcome::Written(path) => log::info!("rates written to {}", path.display()),
        ExportOutcome::Failed(reason) => log::warn!("rates not written: {}", reason),
        ExportOutcome::Disabled => {}
    }
    Ok(())
}

fn main() -> ExitCode {
    let args = match parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let config = match &args.config {
        Some(path) => match load_config(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("could not load {}: {}", path.display(), e);
                return ExitCode::FAILURE;
            }
        },
        None => WorkbenchConfig::default(),
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(config.log_level.as_str()))
        .init();

    match run(args, config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
