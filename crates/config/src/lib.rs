//! Configuration loading, validation, and env substitution.
//!
//! Config files: `moltis.toml`, `moltis.yaml`, or `moltis.json`
//! Searched in `./` then `~/.config/moltis/`.
//!
//! Supports `${ENV_VAR}` substitution in all string values.

pub mod env_subst;
pub mod error;
pub mod loader;
pub mod schema;
pub mod validate;

pub use {
    error::{Error, Result},
    loader::{config_dir, discover_and_load, find_config_file, load_config},
    schema::{
        AgentDefaults, AgentsConfig, ChannelAccountConfig, ChannelConfig, ChannelsConfig,
        GroupConfig, MoltisConfig, ScopeOverrides,
    },
    validate::{Diagnostic, Severity, ValidationResult, validate, validate_str},
};
