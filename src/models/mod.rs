//! Domain models and data structures.
//!
//! This module contains the canonical data model shared by every service:
//! chain configuration, currency identities and the normalized entities
//! produced by the parsers.

pub mod core;

pub use self::core::*;
