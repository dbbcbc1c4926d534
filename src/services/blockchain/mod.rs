//! Raw provider access.
//!
//! This module provides the seam between the crate and the outside world:
//! - [`ProviderClient`] - raw JSON fetch per operation
//! - [`HttpProviderClient`] - HTTP implementation with retry middleware
//! - [`ProviderRegistry`] - deterministic provider selection per operation

mod client;
mod error;
mod provider;
mod transport;

pub use client::ProviderClient;
pub use error::TransportError;
pub use provider::{Operation, ProviderApi, ProviderRegistry};
pub use transport::{HttpProviderClient, RouteStyle};
