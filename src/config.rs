use crate::service::format::BlankPolicy;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub report: ReportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
    pub charset: String,
}

/// The single credential pair accepted by the Basic auth layer.
#[derive(Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ReportConfig {
    pub blank_policy: BlankPolicy,
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"***")
            .field("charset", &self.charset)
            .finish()
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Flat view of the process environment; `config` lowercases variable names.
#[derive(Debug, Deserialize)]
struct EnvSettings {
    server_host: String,
    server_port: u16,
    db_host: String,
    db_port: u16,
    db_database: String,
    db_user: String,
    db_password: String,
    db_charset: String,
    auth_username: String,
    auth_password: String,
    report_blank_policy: BlankPolicy,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .set_default("server_host", "127.0.0.1")?
            .set_default("server_port", 8080)?
            .set_default("db_port", 5432)?
            .set_default("db_charset", "UTF8")?
            .set_default("report_blank_policy", "empty")?
            .add_source(config::Environment::default())
            .build()?;

        let mut env: EnvSettings = settings.try_deserialize()?;
        env.db_charset = client_charset(&env.db_charset)?;
        Ok(env.into())
    }
}

/// The driver decodes text as UTF-8 only, so any other client charset
/// would corrupt every text column.
fn client_charset(value: &str) -> Result<String, config::ConfigError> {
    match value.trim().to_ascii_uppercase().as_str() {
        "UTF8" | "UTF-8" => Ok("UTF8".to_string()),
        other => Err(config::ConfigError::Message(format!(
            "DB_CHARSET={} is not supported; only UTF8 is",
            other
        ))),
    }
}

impl From<EnvSettings> for AppConfig {
    fn from(env: EnvSettings) -> Self {
        Self {
            server: ServerConfig {
                host: env.server_host,
                port: env.server_port,
            },
            database: DatabaseConfig {
                host: env.db_host,
                port: env.db_port,
                database: env.db_database,
                user: env.db_user,
                password: env.db_password,
                charset: env.db_charset,
            },
            auth: AuthConfig {
                username: env.auth_username,
                password: env.auth_password,
            },
            report: ReportConfig {
                blank_policy: env.report_blank_policy,
            },
        }
    }
}
