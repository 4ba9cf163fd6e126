//! Common utilities shared by the store, runner and CLI

pub mod config;
pub mod error;
pub mod logging;
pub mod paths;

pub use config::Config;
pub use error::{Error, ErrorKind, ErrorReport, Result};
