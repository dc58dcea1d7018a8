use std::process::ExitCode;

use clap::Parser;

use mirrorsync::config::{Cli, SyncConfig};
use mirrorsync::logging;
use mirrorsync::sync::{SyncDriver, TracingSink};

/// Pass failed mid-run
const EXIT_PASS_FAILED: u8 = 1;
/// Bad source or replica root, or unusable configuration
const EXIT_STARTUP: u8 = 3;

fn main() -> ExitCode {
    // clap exits with status 2 on usage errors
    let cli = Cli::parse();

    let config = match SyncConfig::resolve(&cli) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Error: {}", err);
            return ExitCode::from(EXIT_STARTUP);
        }
    };

    let _guard = match logging::init(&config.log_file, config.verbosity) {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("Error: {:?}", err);
            return ExitCode::from(EXIT_STARTUP);
        }
    };

    let mut driver = SyncDriver::from_config(&config);
    match driver.run(&mut TracingSink) {
        Ok(summary) => {
            tracing::debug!(
                passes = summary.passes,
                failed = summary.failed_passes,
                "synchronization finished"
            );
            ExitCode::SUCCESS
        }
        Err(err) if err.is_startup() => {
            tracing::error!("{}", err);
            ExitCode::from(EXIT_STARTUP)
        }
        Err(err) => {
            tracing::error!("synchronization pass failed: {}", err);
            ExitCode::from(EXIT_PASS_FAILED)
        }
    }
}
