//! Config mode.

use super::*;

/// Studystream config mode.
#[derive(Clone, Subcommand)]
pub enum ConfigMode {
    /// Verify configuration.
    Verify,
}

/// Run the config mode.
pub fn config_cli(mode: ConfigMode, config_path: PathBuf) -> Result<()> {
    match mode {
        ConfigMode::Verify => {
            let config_data = match std::fs::read_to_string(&config_path) {
                Ok(data) => data,
                Err(e) => {
                    bail!("Unable to read config {:?}: {}", config_path, e)
                }
            };
            let config: Config = match toml::from_str(&config_data) {
                Ok(config) => config,
                Err(e) => bail!("Configuration is not valid: {}", e),
            };
            println!("Configuration at {:?} is valid.", config_path);
            println!("{:#?}", config);
        }
    }
    Ok(())
}
