use super::*;

pub use blobs::*;
pub use cli::*;
pub use config::*;
pub use database::*;
pub use logging::*;
pub use modes::*;
pub use session::*;

pub(crate) mod internal {
    pub use std::cell::LazyCell;
    pub use std::collections::HashMap;
    pub use std::future::Future;
    pub use std::sync::Arc;
    pub use std::{path::PathBuf, str::FromStr};

    pub use anyhow::{Result, bail};
    pub use clap::{Parser, Subcommand};
    pub use resolve_path::PathResolveExt;
    pub use serde::{Deserialize, Serialize};
    pub use studystream_feed::prelude::{self as studyfeed};
    pub use tokio::sync::{Mutex, RwLock};
    pub use tokio::task::JoinSet;
    pub use tokio_util::sync::CancellationToken;
}
