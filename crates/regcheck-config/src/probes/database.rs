// crates/regcheck-config/src/probes/database.rs
// ============================================================================
// Module: Database Probe
// Description: PostgreSQL, MySQL and SQLite connectivity checks.
// Purpose: Connect with the configured URI and report version facts.
// Dependencies: rusqlite, sqlx
// ============================================================================

//! ## Overview
//! PostgreSQL and MySQL connect through `sqlx` with the configured TLS mode
//! and CA. SQLite opens the file read-only so a typo never creates a new
//! database. PostgreSQL also reports installed extensions.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::str::FromStr;

use async_trait::async_trait;
use regcheck_core::DatabaseEngine;
use regcheck_core::DatabaseFacts;
use regcheck_core::DatabaseProbe;
use regcheck_core::DatabaseRequest;
use regcheck_core::ProbeError;
use rusqlite::OpenFlags;
use sqlx::Connection;
use sqlx::mysql::MySqlConnectOptions;
use sqlx::mysql::MySqlConnection;
use sqlx::mysql::MySqlSslMode;
use sqlx::postgres::PgConnectOptions;
use sqlx::postgres::PgConnection;
use sqlx::postgres::PgSslMode;

use crate::probes::transport::run_blocking;

// ============================================================================
// SECTION: Probe
// ============================================================================

/// Database probe.
#[derive(Debug, Clone, Copy, Default)]
pub struct LiveDatabase;

#[async_trait]
impl DatabaseProbe for LiveDatabase {
    async fn connect(&self, request: &DatabaseRequest) -> Result<DatabaseFacts, ProbeError> {
        match request.engine {
            DatabaseEngine::Postgres => postgres(request).await,
            DatabaseEngine::Mysql => mysql(request).await,
            DatabaseEngine::Sqlite => {
                let path = sqlite_path(&request.url).to_string();
                run_blocking(move || sqlite(&path)).await
            }
        }
    }
}

/// Connects to PostgreSQL and reads version and extensions.
async fn postgres(request: &DatabaseRequest) -> Result<DatabaseFacts, ProbeError> {
    let mut options = PgConnectOptions::from_str(&request.url).map_err(map_error)?;
    if let Some(mode) = &request.ssl_mode {
        options = options.ssl_mode(mode.parse::<PgSslMode>().map_err(map_error)?);
    }
    if let Some(pem) = &request.ca_pem {
        options = options.ssl_root_cert_from_pem(pem.clone());
    }
    let mut connection = PgConnection::connect_with(&options).await.map_err(map_error)?;
    let server_version: String =
        sqlx::query_scalar("SHOW server_version").fetch_one(&mut connection).await.map_err(map_error)?;
    let extensions: Vec<String> =
        sqlx::query_scalar("SELECT extname::text FROM pg_extension").fetch_all(&mut connection).await.map_err(map_error)?;
    let _ = connection.close().await;
    Ok(DatabaseFacts {
        server_version,
        extensions,
    })
}

/// Connects to MySQL and reads the version.
async fn mysql(request: &DatabaseRequest) -> Result<DatabaseFacts, ProbeError> {
    let mut options = MySqlConnectOptions::from_str(&request.url).map_err(map_error)?;
    if let Some(mode) = request.ssl_mode.as_deref().and_then(mysql_ssl_mode) {
        options = options.ssl_mode(mode);
    }
    if let Some(pem) = &request.ca_pem {
        options = options.ssl_ca_from_pem(pem.clone());
    }
    let mut connection = MySqlConnection::connect_with(&options).await.map_err(map_error)?;
    let server_version: String =
        sqlx::query_scalar("SELECT VERSION()").fetch_one(&mut connection).await.map_err(map_error)?;
    let _ = connection.close().await;
    Ok(DatabaseFacts {
        server_version,
        extensions: Vec::new(),
    })
}

/// Maps libpq-style modes onto MySQL modes.
fn mysql_ssl_mode(mode: &str) -> Option<MySqlSslMode> {
    match mode {
        "disable" => Some(MySqlSslMode::Disabled),
        "allow" | "prefer" => Some(MySqlSslMode::Preferred),
        "require" => Some(MySqlSslMode::Required),
        "verify-ca" => Some(MySqlSslMode::VerifyCa),
        "verify-full" => Some(MySqlSslMode::VerifyIdentity),
        _ => None,
    }
}

/// File path of a `sqlite:///path` URI.
#[must_use]
pub fn sqlite_path(url: &str) -> &str {
    url.strip_prefix("sqlite:///").or_else(|| url.strip_prefix("sqlite://")).unwrap_or(url)
}

/// Opens a SQLite file read-only and reads the library version.
fn sqlite(path: &str) -> Result<DatabaseFacts, ProbeError> {
    let connection = rusqlite::Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)
        .map_err(|err| ProbeError::Transport(format!("cannot open sqlite database {path}: {err}")))?;
    let server_version = connection
        .query_row("SELECT sqlite_version()", [], |row| row.get::<_, String>(0))
        .map_err(|err| ProbeError::Transport(format!("sqlite query failed: {err}")))?;
    Ok(DatabaseFacts {
        server_version,
        extensions: Vec::new(),
    })
}

/// Maps driver errors, separating server-side rejections.
fn map_error(err: sqlx::Error) -> ProbeError {
    match err {
        sqlx::Error::Database(db) => ProbeError::Rejected(db.message().to_string()),
        sqlx::Error::Configuration(inner) => ProbeError::Transport(format!("invalid DB_URI: {inner}")),
        other => ProbeError::Transport(other.to_string()),
    }
}
