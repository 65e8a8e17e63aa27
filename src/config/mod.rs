//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! optional TOML file (--config)
//!     → loader.rs::load_file (parse & deserialize into FileConfig)
//! process environment
//!     → loader.rs::DeployConfig::from_env (env > file > preset defaults)
//!     → validation.rs (semantic checks)
//!     → DeployConfig (validated, immutable)
//!     → passed by reference to every deployment step
//! ```
//!
//! # Design Decisions
//! - Config is resolved once at startup; nothing reads the environment later
//! - Credentials and the signed transaction only come from the environment
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::ConfigError;
pub use schema::{DeployConfig, FileConfig, NetworkEndpoints, NetworkPreset, TimeoutConfig};
