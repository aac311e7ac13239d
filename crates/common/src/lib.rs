//! Common utilities and types shared across proxy health components.

pub mod error;
pub mod logging;

pub use error::{Error, Result};
