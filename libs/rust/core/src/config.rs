//! Layered configuration: service defaults, optional file, then `PACKWISE__*` env vars.

use anyhow::Result;
use config::{builder::DefaultState, Config, ConfigBuilder, ConfigError};
use serde::de::DeserializeOwned;

pub const CONFIG_FILE_ENV: &str = "PACKWISE_CONFIG_FILE";
pub const ENV_PREFIX: &str = "PACKWISE";

/// Builds `T` from the layered sources. `defaults` seeds keys the service owns;
/// `service_name` is always seeded with `service`.
///
/// A file named by `PACKWISE_CONFIG_FILE` that does not exist is skipped.
pub fn load_config<T, F>(service: &str, defaults: F) -> Result<T>
where
    T: DeserializeOwned,
    F: FnOnce(ConfigBuilder<DefaultState>) -> Result<ConfigBuilder<DefaultState>, ConfigError>,
{
    let mut builder = defaults(Config::builder().set_default("service_name", service)?)?;
    if let Ok(file) = std::env::var(CONFIG_FILE_ENV) {
        builder = builder.add_source(config::File::with_name(&file).required(false));
    }
    builder = builder.add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"));
    let cfg = builder.build()?;
    Ok(cfg.try_deserialize()?)
}
