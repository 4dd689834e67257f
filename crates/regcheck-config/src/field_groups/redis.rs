// crates/regcheck-config/src/field_groups/redis.rs
// ============================================================================
// Module: Redis
// Description: Build log, user event and pull metric cache connections.
// Purpose: Validate cache connection objects and PING each server.
// Dependencies: regcheck-core
// ============================================================================

//! Cache connection objects. Each configured connection is pinged once.

// ============================================================================
// SECTION: Imports
// ============================================================================

use regcheck_core::CacheRequest;
use regcheck_core::ConfigError;
use regcheck_core::Finding;
use regcheck_core::RawConfig;
use regcheck_core::ValidationOptions;
use regcheck_core::rules;
use regcheck_core::runtime::bounded;
use serde::Deserialize;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Field group name.
pub const NAME: &str = "Redis";
/// Keys owned by this group.
pub const FIELDS: &[&str] = &["BUILDLOGS_REDIS", "USER_EVENTS_REDIS", "PULL_METRICS_REDIS"];
/// Default Redis port.
pub const DEFAULT_PORT: i64 = 6379;

// ============================================================================
// SECTION: Types
// ============================================================================

/// One cache connection object.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RedisConnection {
    /// Host name.
    pub host: Option<String>,
    /// TCP port.
    #[serde(deserialize_with = "regcheck_core::document::flexible_int")]
    pub port: Option<i64>,
    /// Password.
    pub password: Option<String>,
    /// ACL user name.
    pub username: Option<String>,
    /// Use TLS.
    pub ssl: Option<bool>,
}

impl std::fmt::Debug for RedisConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisConnection")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("ssl", &self.ssl)
            .finish_non_exhaustive()
    }
}

/// Cache settings, keyed by configuration key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Redis {
    /// Connections in declaration order; absent keys are skipped.
    pub connections: Vec<(&'static str, RedisConnection)>,
}

impl Redis {
    /// Decodes the group.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Construction`] for mistyped values.
    pub fn from_raw(raw: &RawConfig) -> Result<Self, ConfigError> {
        let mut connections = Vec::new();
        for key in FIELDS {
            if let Some(connection) = raw.decode::<RedisConnection>(key)? {
                connections.push((*key, connection));
            }
        }
        Ok(Self {
            connections,
        })
    }

    /// Structural rules.
    #[must_use]
    pub fn check(&self) -> Vec<Finding> {
        let mut findings = Vec::new();
        for (key, connection) in &self.connections {
            findings.extend(rules::require_string(NAME, &format!("{key}.host"), connection.host.as_deref()));
            if let Some(port) = connection.port {
                findings.extend(rules::port(NAME, &format!("{key}.port"), port));
            }
        }
        findings
    }

    /// PINGs every configured server.
    pub async fn probe(&self, options: &ValidationOptions) -> Vec<Finding> {
        let mut findings = Vec::new();
        for (key, connection) in &self.connections {
            let port = connection.port.unwrap_or(DEFAULT_PORT);
            let Ok(port) = u16::try_from(port) else {
                continue;
            };
            let request = CacheRequest {
                host: connection.host.clone().unwrap_or_default().trim().to_string(),
                port,
                username: connection.username.clone().filter(|name| !name.is_empty()),
                password: connection.password.clone().filter(|password| !password.is_empty()),
                tls: connection.ssl.unwrap_or(false),
            };
            let target = format!("cache {key}");
            if let Err(err) = bounded(options, &target, options.probes.cache.ping(&request)).await {
                findings.push(Finding::error(
                    NAME,
                    *key,
                    format!("could not connect to redis at {}:{}: {err}", request.host, request.port),
                ));
            }
        }
        findings
    }
}
