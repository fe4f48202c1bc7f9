//! Post management.

use super::*;

mod post;
mod post_set;

pub use post::*;
pub use post_set::*;
