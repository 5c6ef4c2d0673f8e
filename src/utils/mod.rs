//! The `utils` module provides shared definitions used across `shuttlehub`:
//! the crate's error types and the logging bootstrap.

pub mod error;
pub mod logging;
