//! Studystream configuration.

use super::*;

/// Configuration for studystream.
/// This is parsed from the toml studystream configuration file.
#[derive(Debug, Serialize, Deserialize)]
pub struct Config {
    /// Log file.
    pub log: Option<String>,
    /// Sqlite database file for accounts and posts.
    pub database: Option<String>,
    /// Directory for uploaded files.
    pub files: Option<String>,
    /// Maximum number of posts served in the feed.
    pub storage: Option<u16>,
    // Serve configuration.
    #[serde(default)]
    pub serve: ServeConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log: None,
            database: None,
            files: None,
            storage: None,
            serve: ServeConfig::default(),
        }
    }
}

impl Config {
    /// Create the studystream backend from the parsed configuration.
    pub async fn backend(&self) -> Result<Backend> {
        let database = Database::new(match &self.database {
            Some(db) => db.as_str(),
            None => ":memory:",
        })
        .await?;
        let blobs = FsBlobs::new(match &self.files {
            Some(dir) => dir.clone(),
            None => default_files_dir(),
        })?;
        Ok(Backend {
            database: Arc::new(database),
            blobs: Arc::new(blobs),
        })
    }

    /// How many posts the feed endpoint will fetch at most.
    pub fn feed_limit(&self) -> usize {
        self.storage.unwrap_or(DEFAULT_STORAGE) as usize
    }
}

/// The wired-up collaborators the application talks to.
pub struct Backend {
    /// Identity provider and document store.
    pub database: Arc<Database>,
    /// Object store for uploads.
    pub blobs: Arc<FsBlobs>,
}

fn default_files_dir() -> String {
    use directories::ProjectDirs;
    if let Some(dirs) = ProjectDirs::from("", "", "studystream") {
        let mut files = dirs.data_dir().to_path_buf();
        files.push("files");
        String::from(files.to_string_lossy())
    } else {
        "~/.local/share/studystream/files".to_owned()
    }
}
