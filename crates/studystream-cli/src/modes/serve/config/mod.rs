//! Serve mode configuration.

use super::*;

/// Configuration for the serve mode.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServeConfig {
    /// Port to serve on.
    pub port: Option<u16>,
    /// How long feed responses may be cached.
    /// Unset disables caching; new posts show up immediately.
    #[serde(default, with = "humantime_serde::option")]
    pub cache: Option<std::time::Duration>,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            port: None,
            cache: None,
        }
    }
}
