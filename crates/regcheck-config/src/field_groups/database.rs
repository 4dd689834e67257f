// crates/regcheck-config/src/field_groups/database.rs
// ============================================================================
// Module: Database
// Description: Primary database URI and connection arguments.
// Purpose: Validate the database reference and probe the server.
// Dependencies: regcheck-core, url
// ============================================================================

//! ## Overview
//! `DB_URI` must use `postgresql`, `mysql+pymysql` or `sqlite`. TLS options in
//! `DB_CONNECTION_ARGS` are checked against their allowed values, and a CA
//! file they reference must be in the bundle. The probe connects and reads
//! the server version; PostgreSQL additionally needs `pg_trgm`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use regcheck_core::Certificates;
use regcheck_core::ConfigError;
use regcheck_core::DatabaseEngine;
use regcheck_core::DatabaseRequest;
use regcheck_core::Finding;
use regcheck_core::RawConfig;
use regcheck_core::ValidationOptions;
use regcheck_core::rules;
use regcheck_core::runtime::bounded;
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use crate::bundle::bundle_relative;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Field group name.
pub const NAME: &str = "Database";
/// Keys owned by this group.
pub const FIELDS: &[&str] = &["DB_URI", "DB_CONNECTION_ARGS"];
/// Accepted `DB_URI` schemes.
pub const SCHEMES: &[&str] = &["postgresql", "mysql+pymysql", "sqlite"];
/// Accepted `sslmode` values.
pub const SSL_MODES: &[&str] = &["disable", "allow", "prefer", "require", "verify-ca", "verify-full"];
/// Accepted TLS protocol bounds.
pub const TLS_VERSIONS: &[&str] = &["TLSv1", "TLSv1.1", "TLSv1.2", "TLSv1.3"];
/// Oldest PostgreSQL major version that is still supported.
pub const MIN_POSTGRES_MAJOR: u32 = 13;
/// Extension required on PostgreSQL.
pub const REQUIRED_EXTENSION: &str = "pg_trgm";

// ============================================================================
// SECTION: Types
// ============================================================================

/// MySQL `ssl` sub-object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DbSsl {
    /// CA certificate path.
    pub ca: Option<String>,
}

/// `DB_CONNECTION_ARGS`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct DbConnectionArgs {
    /// PostgreSQL TLS mode.
    pub sslmode: Option<String>,
    /// PostgreSQL CA path.
    pub sslrootcert: Option<String>,
    /// MySQL TLS options.
    pub ssl: Option<DbSsl>,
    /// Lowest TLS protocol.
    pub ssl_min_protocol_version: Option<String>,
    /// Highest TLS protocol.
    pub ssl_max_protocol_version: Option<String>,
    /// Per-thread connections.
    pub threadlocals: Option<bool>,
    /// Roll back on connection return.
    pub autorollback: Option<bool>,
    /// Options passed through to the driver unchecked.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Database settings.
#[derive(Clone, PartialEq)]
pub struct Database {
    /// Connection URI.
    pub db_uri: Option<String>,
    /// Connection arguments.
    pub connection_args: DbConnectionArgs,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").field("connection_args", &self.connection_args).finish_non_exhaustive()
    }
}

impl Database {
    /// Decodes the group.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Construction`] for mistyped values.
    pub fn from_raw(raw: &RawConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            db_uri: raw.decode("DB_URI")?,
            connection_args: raw.decode_or_default("DB_CONNECTION_ARGS")?,
        })
    }

    /// Bundle reference of the configured CA, if any.
    fn ca_reference(&self) -> Option<(&'static str, &str)> {
        let args = &self.connection_args;
        if let Some(path) = args.sslrootcert.as_deref().filter(|path| !path.trim().is_empty()) {
            return Some(("DB_CONNECTION_ARGS.sslrootcert", path));
        }
        args.ssl
            .as_ref()
            .and_then(|ssl| ssl.ca.as_deref())
            .filter(|path| !path.trim().is_empty())
            .map(|path| ("DB_CONNECTION_ARGS.ssl.ca", path))
    }

    /// Structural rules.
    #[must_use]
    pub fn check(&self, certificates: &Certificates) -> Vec<Finding> {
        let mut findings = Vec::new();
        if let Some(uri) = self.db_uri.as_deref().filter(|uri| !uri.trim().is_empty()) {
            match Url::parse(uri) {
                Ok(parsed) => findings.extend(rules::one_of(NAME, "DB_URI", parsed.scheme(), SCHEMES)),
                Err(err) => findings.push(Finding::error(NAME, "DB_URI", format!("DB_URI is not a valid url: {err}"))),
            }
        }
        let args = &self.connection_args;
        if let Some(mode) = &args.sslmode {
            findings.extend(rules::one_of(NAME, "DB_CONNECTION_ARGS.sslmode", mode, SSL_MODES));
        }
        if let Some(version) = &args.ssl_min_protocol_version {
            findings.extend(rules::one_of(NAME, "DB_CONNECTION_ARGS.ssl_min_protocol_version", version, TLS_VERSIONS));
        }
        if let Some(version) = &args.ssl_max_protocol_version {
            findings.extend(rules::one_of(NAME, "DB_CONNECTION_ARGS.ssl_max_protocol_version", version, TLS_VERSIONS));
        }
        if let Some((path, reference)) = self.ca_reference() {
            findings.extend(rules::certificate_present(NAME, path, certificates, bundle_relative(reference)));
        }
        findings
    }

    /// Connects, then checks version and extensions.
    pub async fn probe(&self, options: &ValidationOptions) -> Vec<Finding> {
        let Some(uri) = self.db_uri.as_deref().map(str::trim).filter(|uri| !uri.is_empty()) else {
            return Vec::new();
        };
        let Some(engine) = engine_for(uri) else {
            return Vec::new();
        };
        let request = DatabaseRequest {
            engine,
            url: native_url(uri, engine),
            ssl_mode: self.connection_args.sslmode.clone(),
            ca_pem: self
                .ca_reference()
                .and_then(|(_, reference)| options.certificates.get(bundle_relative(reference)))
                .map(<[u8]>::to_vec),
        };
        let facts = match bounded(options, "database", options.probes.database.connect(&request)).await {
            Ok(facts) => facts,
            Err(err) => {
                return vec![Finding::error(NAME, "DB_URI", format!("could not connect to database: {err}"))];
            }
        };
        let mut findings = Vec::new();
        if engine == DatabaseEngine::Postgres {
            match major_version(&facts.server_version) {
                Some(major) if major < MIN_POSTGRES_MAJOR => findings.push(Finding::warning(
                    NAME,
                    "DB_URI",
                    format!("PostgreSQL {major} is end of life; consider upgrading"),
                )),
                Some(_) => {}
                None => findings.push(Finding::warning(
                    NAME,
                    "DB_URI",
                    format!("could not parse PostgreSQL version `{}`", facts.server_version),
                )),
            }
            if !facts.extensions.iter().any(|name| name.contains(REQUIRED_EXTENSION)) {
                findings.push(Finding::error(
                    NAME,
                    "DB_URI",
                    "if you are using a Postgres database, you must install the pg_trgm extension",
                ));
            }
        }
        findings
    }
}

/// Engine implied by the URI scheme.
fn engine_for(uri: &str) -> Option<DatabaseEngine> {
    match uri.split_once("://").map(|(scheme, _)| scheme) {
        Some("postgresql") => Some(DatabaseEngine::Postgres),
        Some("mysql+pymysql") => Some(DatabaseEngine::Mysql),
        Some("sqlite") => Some(DatabaseEngine::Sqlite),
        _ => None,
    }
}

/// Rewrites the URI into the scheme the native client understands.
fn native_url(uri: &str, engine: DatabaseEngine) -> String {
    match engine {
        DatabaseEngine::Mysql => uri.replacen("mysql+pymysql://", "mysql://", 1),
        DatabaseEngine::Postgres | DatabaseEngine::Sqlite => uri.to_string(),
    }
}

/// Leading integer of a version string.
#[must_use]
pub fn major_version(version: &str) -> Option<u32> {
    let digits: String = version.trim().chars().take_while(char::is_ascii_digit).collect();
    digits.parse().ok()
}
