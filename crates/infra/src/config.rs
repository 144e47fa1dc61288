//! Configuration loading and representation.
//!
//! Values come from the process environment, optionally seeded from a `.env`
//! file in the working directory. Variables already set in the environment
//! win over the file.

use thiserror::Error;

/// Port used when `SERVER_PORT` is unset or empty.
pub const DEFAULT_SERVER_PORT: u16 = 8080;

pub const DB_TYPE: &str = "DB_TYPE";
pub const POSTGRESQL_URL: &str = "POSTGRESQL_URL";
pub const MONGODB_URL: &str = "MONGODB_URL";
pub const SERVER_PORT: &str = "SERVER_PORT";

/// Which storage driver to run, with its connection string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseConfig {
    Postgres { url: String },
    Mongo { url: String },
    Memory,
}

impl DatabaseConfig {
    /// The `DB_TYPE` spelling of this driver (safe to log; no credentials).
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Postgres { .. } => "postgresql",
            Self::Mongo { .. } => "mongodb",
            Self::Memory => "memory",
        }
    }
}

/// Process configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub server_port: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("DB_TYPE is not set; must be 'postgresql', 'mongodb' or 'memory'")]
    MissingDbType,

    #[error("invalid DB_TYPE '{0}'; must be 'postgresql', 'mongodb' or 'memory'")]
    InvalidDbType(String),

    #[error("{var} must be set when DB_TYPE={db_type}")]
    MissingUrl {
        var: &'static str,
        db_type: &'static str,
    },

    #[error("invalid SERVER_PORT '{value}': {reason}")]
    InvalidPort { value: String, reason: String },
}

/// Load `.env` into the process environment if present.
///
/// Returns `false` when no file was found (or it could not be read); callers
/// log that and carry on with the real environment.
pub fn load_dotenv() -> bool {
    dotenvy::dotenv().is_ok()
}

impl AppConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let db_type = get(DB_TYPE).ok_or(ConfigError::MissingDbType)?;
        let database = match db_type.trim().to_ascii_lowercase().as_str() {
            "postgresql" => DatabaseConfig::Postgres {
                url: get(POSTGRESQL_URL).ok_or(ConfigError::MissingUrl {
                    var: POSTGRESQL_URL,
                    db_type: "postgresql",
                })?,
            },
            "mongodb" => DatabaseConfig::Mongo {
                url: get(MONGODB_URL).ok_or(ConfigError::MissingUrl {
                    var: MONGODB_URL,
                    db_type: "mongodb",
                })?,
            },
            "memory" => DatabaseConfig::Memory,
            _ => return Err(ConfigError::InvalidDbType(db_type)),
        };

        let server_port = match get(SERVER_PORT) {
            None => DEFAULT_SERVER_PORT,
            Some(raw) => raw.trim().parse::<u16>().map_err(|e| {
                ConfigError::InvalidPort {
                    value: raw.clone(),
                    reason: e.to_string(),
                }
            })?,
        };

        Ok(Self {
            database,
            server_port,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn postgres_with_default_port() {
        let cfg = load(&[
            ("DB_TYPE", "postgresql"),
            ("POSTGRESQL_URL", "postgres://localhost/blog"),
        ])
        .unwrap();

        assert_eq!(
            cfg.database,
            DatabaseConfig::Postgres {
                url: "postgres://localhost/blog".to_string()
            }
        );
        assert_eq!(cfg.server_port, DEFAULT_SERVER_PORT);
        assert_eq!(cfg.database.kind(), "postgresql");
    }

    #[test]
    fn mongodb_with_explicit_port() {
        let cfg = load(&[
            ("DB_TYPE", "mongodb"),
            ("MONGODB_URL", "mongodb://localhost:27017"),
            ("SERVER_PORT", "9090"),
        ])
        .unwrap();

        assert_eq!(cfg.database.kind(), "mongodb");
        assert_eq!(cfg.server_port, 9090);
    }

    #[test]
    fn empty_port_falls_back_to_default() {
        let cfg = load(&[("DB_TYPE", "memory"), ("SERVER_PORT", "")]).unwrap();
        assert_eq!(cfg.database, DatabaseConfig::Memory);
        assert_eq!(cfg.server_port, 8080);
    }

    #[test]
    fn missing_or_unknown_db_type_is_rejected() {
        assert_eq!(load(&[]), Err(ConfigError::MissingDbType));
        assert_eq!(
            load(&[("DB_TYPE", "sqlite")]),
            Err(ConfigError::InvalidDbType("sqlite".to_string()))
        );
    }

    #[test]
    fn selected_driver_requires_its_url() {
        assert_eq!(
            load(&[("DB_TYPE", "postgresql"), ("MONGODB_URL", "mongodb://x")]),
            Err(ConfigError::MissingUrl {
                var: POSTGRESQL_URL,
                db_type: "postgresql"
            })
        );
        assert_eq!(
            load(&[("DB_TYPE", "mongodb"), ("MONGODB_URL", "  ")]),
            Err(ConfigError::MissingUrl {
                var: MONGODB_URL,
                db_type: "mongodb"
            })
        );
    }

    #[test]
    fn unparsable_port_is_rejected() {
        let err = load(&[("DB_TYPE", "memory"), ("SERVER_PORT", "eighty")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPort { ref value, .. } if value == "eighty"));

        assert!(load(&[("DB_TYPE", "memory"), ("SERVER_PORT", "70000")]).is_err());
    }
}
