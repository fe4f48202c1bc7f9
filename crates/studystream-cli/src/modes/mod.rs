//! Studystream modes.

use super::*;

mod config;
mod serve;

pub use config::*;
pub use serve::*;
