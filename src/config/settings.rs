use config::ConfigError;
use serde::Deserialize;

/// Placeholder secret shipped in the defaults. The server refuses to use it.
pub const DEFAULT_JWT_SECRET: &str = "change-me";

/// Top-level configuration settings for the application.
///
/// Includes settings for the server, the registry and logging.
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub registry: RegistrySettings,
    pub logging: LoggingSettings,
}

/// Configuration settings for the server.
///
/// Defines the bind address and the secret used to verify caller tokens.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
}

/// Configuration settings for the registry.
///
/// `data_dir` selects a sled store; without it the registry lives in memory.
#[derive(Debug, Deserialize, Clone)]
pub struct RegistrySettings {
    pub admin: String,
    pub data_dir: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingSettings {
    pub level: String,
}

/// Partial configuration settings loaded from files or environment.
///
/// Allows partial specification of settings. Missing values can be filled using defaults.
#[derive(Debug, Deserialize)]
pub struct PartialSettings {
    pub server: Option<PartialServerSettings>,
    pub registry: Option<PartialRegistrySettings>,
    pub logging: Option<PartialLoggingSettings>,
}

#[derive(Debug, Deserialize)]
pub struct PartialServerSettings {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub jwt_secret: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PartialRegistrySettings {
    pub admin: Option<String>,
    pub data_dir: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PartialLoggingSettings {
    pub level: Option<String>,
}

/// Provides default values for `Settings`.
///
/// Ensures the application has sensible defaults if no configuration is provided.
impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerSettings {
                host: "127.0.0.1".to_string(),
                port: 8080,
                jwt_secret: DEFAULT_JWT_SECRET.to_string(),
            },
            registry: RegistrySettings {
                admin: "admin".to_string(),
                data_dir: None,
            },
            logging: LoggingSettings {
                level: "info".to_string(),
            },
        }
    }
}

impl ServerSettings {
    /// Rejects an empty or placeholder `jwt_secret`. Anyone who knows it can
    /// sign a token for the administrator.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.is_empty() || self.jwt_secret == DEFAULT_JWT_SECRET {
            return Err(ConfigError::Message(
                "server.jwt_secret is unset or left at its placeholder; \
                 set POPREG_SERVER__JWT_SECRET"
                    .to_string(),
            ));
        }
        Ok(())
    }
}
