//! Layered configuration: an optional file, then `SHUTTLEHUB_*` environment
//! variables, merged onto built-in defaults.

mod settings;

use config::{Config, Environment, File};

use crate::utils::error::HubError;

pub use settings::{
    AdminSettings, BrokerSettings, LogSettings, PartialSettings, ServerSettings, Settings,
};

/// Environment variable prefix. Nested keys use `__`, e.g.
/// `SHUTTLEHUB_SERVER__PORT=9000`.
pub const ENV_PREFIX: &str = "SHUTTLEHUB";

/// Loads the configuration from `config/default` (any supported format) and
/// the environment.
pub fn load_config() -> Result<Settings, HubError> {
    load_config_from("config/default")
}

/// Like [`load_config`] but reads the file source from `path`. The file is
/// optional; a missing file yields the defaults plus environment overrides.
pub fn load_config_from(path: &str) -> Result<Settings, HubError> {
    let builder = Config::builder()
        .add_source(File::with_name(path).required(false))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__"),
        );

    let config = builder.build()?;

    // Try to deserialize what is available
    let partial: PartialSettings = config.try_deserialize()?;

    Ok(Settings::merge(partial))
}

#[cfg(test)]
mod tests;
