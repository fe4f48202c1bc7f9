//! CLI.

use super::*;

#[derive(Parser)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to the configuration file.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,
    /// Log at debug level.
    #[arg(short, long, action)]
    pub debug: bool,
    /// Log at trace level.
    #[arg(short, long, action)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: CommandMode,
}

impl Cli {
    /// Determine the config path, creating parents if necessary.
    pub fn config_path(&self) -> Result<PathBuf> {
        let config_path: PathBuf = match &self.config {
            Some(path) => path.clone(),
            None => match PathBuf::from_str(&*DEFAULT_CONFIG_DIR) {
                Ok(p) => p,
                Err(e) => {
                    bail!(
                        "Invalid default config {}: {}.",
                        &*DEFAULT_CONFIG_DIR,
                        e
                    );
                }
            },
        }
        .resolve()
        .into();
        // Make directory if it doesn't exist.
        if let Some(parent_dir) = config_path.parent() {
            if !parent_dir.exists() {
                std::fs::create_dir_all(parent_dir).ok();
            }
        }
        Ok(config_path)
    }

    /// Parse configuration.
    pub fn parse_config(&self) -> Result<Config> {
        let config_path = self.config_path()?;
        // Make file if it doesn't exist.
        if !config_path.exists() {
            if let Err(e) = std::fs::File::create(config_path.as_path()) {
                bail!(
                    "Unable to create config file at {:?}: {}.",
                    config_path,
                    e
                );
            }
        }
        // Read file.
        let config_data = match std::fs::read_to_string(&config_path) {
            Ok(data) => data,
            Err(e) => {
                bail!(
                    "Unable to read data from config file {:?}: {}.",
                    config_path,
                    e
                );
            }
        };
        // Parse.
        match toml::from_str(&config_data) {
            Ok(config) => Ok(config),
            Err(e) => {
                bail!("Configuration file is not valid: {}.", e);
            }
        }
    }
}

/// Studystream command.
#[derive(Subcommand)]
pub enum CommandMode {
    /// Serve the studystream API.
    Serve {
        #[arg(short, long, value_name = "PORT")]
        port: Option<u16>,
    },
    /// Work with the configuration.
    Config {
        #[command(subcommand)]
        config_mode: ConfigMode,
    },
}
