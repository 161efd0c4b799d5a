//! Shared helpers for unit tests

mod async_helpers;
mod endpoint;
mod fixtures;

pub use async_helpers::*;
pub use endpoint::*;
pub use fixtures::*;
