use super::*;

pub use async_trait::async_trait as backend_trait;
pub use backend::*;
pub use datetime::*;
pub use filter::*;
pub use kind::*;
pub use post::*;
pub use subject::*;

pub(crate) mod internal {
    pub use serde::{Deserialize, Serialize};
}
