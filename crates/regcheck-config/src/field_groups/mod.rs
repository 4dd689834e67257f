// crates/regcheck-config/src/field_groups/mod.rs
// ============================================================================
// Module: Field Groups
// Description: The fixed set of per-concern configuration validators.
// Purpose: Decode, check and probe each concern behind one dispatch type.
// Dependencies: regcheck-core, serde
// ============================================================================

//! ## Overview
//! A field group owns a set of top-level keys, decodes them with documented
//! defaults, checks them structurally, and optionally probes the dependency
//! they describe. [`FieldGroup`] names the groups in their fixed order and
//! [`FieldGroupConfig`] holds one decoded instance.
//!
//! Feature-gated groups return no findings while their gate is off.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod access;
pub mod app_token;
pub mod database;
pub mod email;
pub mod host;
pub mod ldap;
pub mod logs_model;
pub mod oidc;
pub mod redis;
pub mod repo_mirror;
pub mod scanner;
pub mod storage;
pub mod time_machine;

// ============================================================================
// SECTION: Imports
// ============================================================================

use regcheck_core::Certificates;
use regcheck_core::ConfigError;
use regcheck_core::Finding;
use regcheck_core::RawConfig;
use regcheck_core::ValidationOptions;
use regcheck_core::document::flexible_int;
use serde::Deserialize;

use self::access::AccessSettings;
use self::app_token::AppTokenAuthentication;
use self::database::Database;
use self::email::Email;
use self::host::HostSettings;
use self::ldap::Ldap;
use self::logs_model::LogsModel;
use self::oidc::Oidc;
use self::redis::Redis;
use self::repo_mirror::RepoMirror;
use self::scanner::SecurityScanner;
use self::storage::DistributedStorage;
use self::time_machine::TimeMachine;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Bundle directory of additional trusted CAs.
pub const EXTRA_CA_DIR: &str = "extra_ca_certs/";

// ============================================================================
// SECTION: Group Identity
// ============================================================================

/// Field group identifiers in validation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldGroup {
    /// Hostname, scheme and TLS material.
    HostSettings,
    /// Primary database.
    Database,
    /// Cache connections.
    Redis,
    /// Object storage.
    DistributedStorage,
    /// Authentication backend and login switches.
    AccessSettings,
    /// App-specific token authentication.
    AppTokenAuthentication,
    /// Directory service authentication.
    Ldap,
    /// OpenID Connect providers.
    Oidc,
    /// Tag expiration.
    TimeMachine,
    /// Mail relay.
    Email,
    /// Vulnerability scanner.
    SecurityScanner,
    /// Repository mirroring.
    RepoMirror,
    /// Action log storage.
    LogsModel,
}

impl FieldGroup {
    /// Every group in validation order.
    pub const ALL: [Self; 13] = [
        Self::HostSettings,
        Self::Database,
        Self::Redis,
        Self::DistributedStorage,
        Self::AccessSettings,
        Self::AppTokenAuthentication,
        Self::Ldap,
        Self::Oidc,
        Self::TimeMachine,
        Self::Email,
        Self::SecurityScanner,
        Self::RepoMirror,
        Self::LogsModel,
    ];

    /// Name used in findings and events.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::HostSettings => host::NAME,
            Self::Database => database::NAME,
            Self::Redis => redis::NAME,
            Self::DistributedStorage => storage::NAME,
            Self::AccessSettings => access::NAME,
            Self::AppTokenAuthentication => app_token::NAME,
            Self::Ldap => ldap::NAME,
            Self::Oidc => oidc::NAME,
            Self::TimeMachine => time_machine::NAME,
            Self::Email => email::NAME,
            Self::SecurityScanner => scanner::NAME,
            Self::RepoMirror => repo_mirror::NAME,
            Self::LogsModel => logs_model::NAME,
        }
    }

    /// Fixed top-level keys owned by the group.
    #[must_use]
    pub const fn fields(self) -> &'static [&'static str] {
        match self {
            Self::HostSettings => host::FIELDS,
            Self::Database => database::FIELDS,
            Self::Redis => redis::FIELDS,
            Self::DistributedStorage => storage::FIELDS,
            Self::AccessSettings => access::FIELDS,
            Self::AppTokenAuthentication => app_token::FIELDS,
            Self::Ldap => ldap::FIELDS,
            Self::Oidc => &[],
            Self::TimeMachine => time_machine::FIELDS,
            Self::Email => email::FIELDS,
            Self::SecurityScanner => scanner::FIELDS,
            Self::RepoMirror => repo_mirror::FIELDS,
            Self::LogsModel => logs_model::FIELDS,
        }
    }

    /// Returns true when the group owns `key`, including dynamic provider keys.
    #[must_use]
    pub fn owns(self, raw: &RawConfig, key: &str) -> bool {
        match self {
            Self::Oidc => oidc::is_provider_key(raw, key),
            _ => self.fields().contains(&key),
        }
    }

    /// Decodes this group from the document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Construction`] when a present value is mistyped.
    pub fn construct(self, raw: &RawConfig) -> Result<FieldGroupConfig, ConfigError> {
        Ok(match self {
            Self::HostSettings => FieldGroupConfig::HostSettings(HostSettings::from_raw(raw)?),
            Self::Database => FieldGroupConfig::Database(Database::from_raw(raw)?),
            Self::Redis => FieldGroupConfig::Redis(Redis::from_raw(raw)?),
            Self::DistributedStorage => FieldGroupConfig::DistributedStorage(DistributedStorage::from_raw(raw)?),
            Self::AccessSettings => FieldGroupConfig::AccessSettings(AccessSettings::from_raw(raw)?),
            Self::AppTokenAuthentication => {
                FieldGroupConfig::AppTokenAuthentication(AppTokenAuthentication::from_raw(raw)?)
            }
            Self::Ldap => FieldGroupConfig::Ldap(Ldap::from_raw(raw)?),
            Self::Oidc => FieldGroupConfig::Oidc(Oidc::from_raw(raw)?),
            Self::TimeMachine => FieldGroupConfig::TimeMachine(TimeMachine::from_raw(raw)?),
            Self::Email => FieldGroupConfig::Email(Email::from_raw(raw)?),
            Self::SecurityScanner => FieldGroupConfig::SecurityScanner(SecurityScanner::from_raw(raw)?),
            Self::RepoMirror => FieldGroupConfig::RepoMirror(RepoMirror::from_raw(raw)?),
            Self::LogsModel => FieldGroupConfig::LogsModel(LogsModel::from_raw(raw)?),
        })
    }
}

// ============================================================================
// SECTION: Decoded Groups
// ============================================================================

/// One decoded field group.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldGroupConfig {
    /// Hostname, scheme and TLS material.
    HostSettings(HostSettings),
    /// Primary database.
    Database(Database),
    /// Cache connections.
    Redis(Redis),
    /// Object storage.
    DistributedStorage(DistributedStorage),
    /// Authentication backend and login switches.
    AccessSettings(AccessSettings),
    /// App-specific token authentication.
    AppTokenAuthentication(AppTokenAuthentication),
    /// Directory service authentication.
    Ldap(Ldap),
    /// OpenID Connect providers.
    Oidc(Oidc),
    /// Tag expiration.
    TimeMachine(TimeMachine),
    /// Mail relay.
    Email(Email),
    /// Vulnerability scanner.
    SecurityScanner(SecurityScanner),
    /// Repository mirroring.
    RepoMirror(RepoMirror),
    /// Action log storage.
    LogsModel(LogsModel),
}

impl FieldGroupConfig {
    /// Identifier of the decoded group.
    #[must_use]
    pub const fn group(&self) -> FieldGroup {
        match self {
            Self::HostSettings(_) => FieldGroup::HostSettings,
            Self::Database(_) => FieldGroup::Database,
            Self::Redis(_) => FieldGroup::Redis,
            Self::DistributedStorage(_) => FieldGroup::DistributedStorage,
            Self::AccessSettings(_) => FieldGroup::AccessSettings,
            Self::AppTokenAuthentication(_) => FieldGroup::AppTokenAuthentication,
            Self::Ldap(_) => FieldGroup::Ldap,
            Self::Oidc(_) => FieldGroup::Oidc,
            Self::TimeMachine(_) => FieldGroup::TimeMachine,
            Self::Email(_) => FieldGroup::Email,
            Self::SecurityScanner(_) => FieldGroup::SecurityScanner,
            Self::RepoMirror(_) => FieldGroup::RepoMirror,
            Self::LogsModel(_) => FieldGroup::LogsModel,
        }
    }

    /// Runs the structural rules. Never performs I/O.
    #[must_use]
    pub fn check(&self, certificates: &Certificates) -> Vec<Finding> {
        match self {
            Self::HostSettings(group) => group.check(certificates),
            Self::Database(group) => group.check(certificates),
            Self::Redis(group) => group.check(),
            Self::DistributedStorage(group) => group.check(certificates),
            Self::AccessSettings(group) => group.check(),
            Self::AppTokenAuthentication(group) => group.check(),
            Self::Ldap(group) => group.check(),
            Self::Oidc(group) => group.check(),
            Self::TimeMachine(group) => group.check(),
            Self::Email(group) => group.check(),
            Self::SecurityScanner(group) => group.check(),
            Self::RepoMirror(group) => group.check(),
            Self::LogsModel(group) => group.check(),
        }
    }

    /// Runs the live probes, if the group has any.
    pub async fn probe(&self, options: &ValidationOptions) -> Vec<Finding> {
        match self {
            Self::Database(group) => group.probe(options).await,
            Self::Redis(group) => group.probe(options).await,
            Self::DistributedStorage(group) => group.probe(options).await,
            Self::Ldap(group) => group.probe(options).await,
            Self::Oidc(group) => group.probe(options).await,
            Self::Email(group) => group.probe(options).await,
            Self::SecurityScanner(group) => group.probe(options).await,
            Self::HostSettings(_)
            | Self::AccessSettings(_)
            | Self::AppTokenAuthentication(_)
            | Self::TimeMachine(_)
            | Self::RepoMirror(_)
            | Self::LogsModel(_) => Vec::new(),
        }
    }
}

// ============================================================================
// SECTION: Shared Helpers
// ============================================================================

/// Lenient integer wrapper for top-level keys.
#[derive(Deserialize)]
#[serde(transparent)]
struct FlexInt(#[serde(deserialize_with = "flexible_int")] Option<i64>);

/// Decodes an integer written as a number or numeric string.
pub(crate) fn int(raw: &RawConfig, key: &str) -> Result<Option<i64>, ConfigError> {
    Ok(raw.decode::<FlexInt>(key)?.and_then(|value| value.0))
}

/// Concatenates the named CA file and every `extra_ca_certs/` entry.
pub(crate) fn trusted_ca_pem(certificates: &Certificates, name: Option<&str>) -> Option<Vec<u8>> {
    let mut pem = Vec::new();
    let named = name.and_then(|name| certificates.get(name));
    let extra = certificates
        .names()
        .filter(|entry| entry.starts_with(EXTRA_CA_DIR))
        .filter_map(|entry| certificates.get(entry));
    for bytes in named.into_iter().chain(extra) {
        pem.extend_from_slice(bytes);
        if !bytes.ends_with(b"\n") {
            pem.push(b'\n');
        }
    }
    (!pem.is_empty()).then_some(pem)
}
