//! Report handling
//!
//! Finding the report a runner produced and distilling it down to the
//! assertions that failed.

pub mod escape;
mod extractor;
mod locator;
pub mod render;

pub use extractor::{extract_failed, failed_tests, FailedTest};
pub use locator::{latest, ReportPattern};
