//! Service modules.

pub mod aggregator;
pub mod blockchain;
pub mod explorer;
pub mod parser;
pub mod validator;
