//! The `utils` module provides shared pieces used across the `popreg`
//! application: the top-level error type and logging setup.

pub mod error;
pub mod logging;
