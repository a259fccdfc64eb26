//! # dr-common
//!
//! Configuration and error types shared by the domrelay binaries.

pub mod config;
pub mod error;

pub use self::config::RelayConfig;
pub use error::{RelayError, RelayResult};
