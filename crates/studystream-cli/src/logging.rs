//! Logging.

use super::*;

use tracing::{Level, level_filters::LevelFilter};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::SubscriberExt;

/// Setup logging.
pub fn setup_logging(cli: &Cli, config: &Config) -> Result<()> {
    let level = match cli.verbose {
        true => Level::TRACE,
        false => match cli.debug {
            true => Level::DEBUG,
            false => Level::INFO,
        },
    };
    let filter = tracing_subscriber::filter::Targets::new()
        .with_default(LevelFilter::OFF)
        .with_target("studystream", level)
        .with_target("studystream_cli", level)
        .with_target("studystream_feed", level);

    // CLI layer (to stderr).
    let cli_logger = tracing_subscriber::fmt::layer()
        .compact()
        .with_writer(std::io::stderr)
        .with_filter(filter.clone());

    // File layer.
    let file_logger = match config.log.as_ref() {
        Some(log_file) => {
            let filename = match shellexpand::full(log_file) {
                Ok(filename) => filename.into_owned(),
                Err(e) => bail!("Unable to expand log file {}: {}", log_file, e),
            };
            let path = match std::path::PathBuf::from_str(&filename) {
                Ok(path) => path,
                Err(e) => bail!("Log file at invalid path {}: {}", filename, e),
            };
            if let Some(parent_dir) = path.parent() {
                if let Err(e) = std::fs::create_dir_all(parent_dir) {
                    bail!("Unable to initialize path for {}: {}", filename, e);
                }
            }
            let file = match std::fs::OpenOptions::new()
                .append(true)
                .create(true)
                .open(&filename)
            {
                Ok(file) => file,
                Err(e) => bail!("Failed to create log file {}: {}", log_file, e),
            };
            Some(
                tracing_subscriber::fmt::layer()
                    .compact()
                    .with_writer(file)
                    .with_filter(filter),
            )
        }
        None => None,
    };

    let subscriber = tracing_subscriber::Registry::default()
        .with(cli_logger)
        .with(file_logger);

    // Set this logger as global.
    if let Err(_) = tracing::subscriber::set_global_default(subscriber) {
        bail!("Unable to initialize logging.");
    }

    Ok(())
}
