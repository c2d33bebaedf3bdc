mod settings;

use crate::config::settings::PartialSettings;
use config::{Config, ConfigError, Environment, File};

pub use settings::{
    DEFAULT_JWT_SECRET, LoggingSettings, RegistrySettings, ServerSettings, Settings,
};

/// Prefix of the environment variables read by [`load_config`], e.g.
/// `POPREG_SERVER__PORT=9000`.
pub const ENV_PREFIX: &str = "POPREG";

/// Loads the configuration from the default file and environment variables
/// Merges the configuration with default values
/// Returns a `Settings` struct containing the server, registry and logging configurations
pub fn load_config() -> Result<Settings, ConfigError> {
    let builder = Config::builder()
        .add_source(File::with_name("config/default").required(false))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

    let config = builder.build()?;

    // Try to deserialize what is available
    let partial: PartialSettings = config.try_deserialize()?;

    // Merge with defaults
    let default = Settings::default();

    let server = partial.server;
    let registry = partial.registry;
    let logging = partial.logging;

    Ok(Settings {
        server: ServerSettings {
            host: server
                .as_ref()
                .and_then(|s| s.host.clone())
                .unwrap_or(default.server.host),
            port: server
                .as_ref()
                .and_then(|s| s.port)
                .unwrap_or(default.server.port),
            jwt_secret: server
                .as_ref()
                .and_then(|s| s.jwt_secret.clone())
                .unwrap_or(default.server.jwt_secret),
        },
        registry: RegistrySettings {
            admin: registry
                .as_ref()
                .and_then(|r| r.admin.clone())
                .unwrap_or(default.registry.admin),
            data_dir: registry
                .as_ref()
                .and_then(|r| r.data_dir.clone())
                .or(default.registry.data_dir),
        },
        logging: LoggingSettings {
            level: logging
                .as_ref()
                .and_then(|l| l.level.clone())
                .unwrap_or(default.logging.level),
        },
    })
}
