pub mod adapters;
pub mod client;
pub mod config;
pub mod core;
pub mod domain;
pub mod server;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliArgs;

pub use client::AegisClient;
pub use config::ServerConfig;
pub use core::service::InferenceService;
pub use utils::error::{AegisError, Result};
