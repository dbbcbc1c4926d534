//! Uniform facade over chain and provider specifics.

pub mod error;
mod service;

pub use error::ExplorerError;
pub use service::ExplorerInterface;
