//! Utility modules for common functionality.

pub mod http;
pub mod logging;
