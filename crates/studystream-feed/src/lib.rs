//! studystream post and feed management.

mod backend;
mod datetime;
mod filter;
mod kind;
mod post;
pub mod prelude;
mod subject;

#[cfg(test)]
mod tests;

use prelude::internal::*;
use prelude::*;
