use crate::config::DatabaseConfig;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{ConnectOptions, PgPool};
use std::time::Duration;

/// Build the connection pool for the billing database.
///
/// The pool connects lazily, so the service starts even when the database
/// is briefly unreachable; each request reports its own failure.
pub fn create_pool(config: &DatabaseConfig) -> PgPool {
    let connect_options = PgConnectOptions::new()
        .host(&config.host)
        .port(config.port)
        .database(&config.database)
        .username(&config.user)
        .password(&config.password)
        .options([("client_encoding", config.charset.as_str())])
        // slow query threshold: 5s
        .log_slow_statements(tracing::log::LevelFilter::Warn, Duration::from_secs(5));

    PgPoolOptions::new()
        .max_connections(20)
        .acquire_timeout(Duration::from_secs(10))
        .connect_lazy_with(connect_options)
}
