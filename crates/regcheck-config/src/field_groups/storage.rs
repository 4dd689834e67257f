// crates/regcheck-config/src/field_groups/storage.rs
// ============================================================================
// Module: Distributed Storage
// Description: Storage entries, preference lists and replication rules.
// Purpose: Validate storage references and probe every entry's backend.
// Dependencies: regcheck-core, regcheck-storage
// ============================================================================

//! ## Overview
//! Per-entry rules and probes live in [`regcheck_storage::resolver`]; this
//! group adds the document-wide rules: every name in the preference and
//! default-location lists must be a configured entry, and replication cannot
//! be combined with local filesystem storage.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use regcheck_core::Certificates;
use regcheck_core::ConfigError;
use regcheck_core::Finding;
use regcheck_core::RawConfig;
use regcheck_core::ValidationOptions;
use regcheck_storage::STORAGE_CONFIG_KEY;
use regcheck_storage::StorageDriver;
use regcheck_storage::StorageEntry;
use regcheck_storage::parse_storage_config;
use regcheck_storage::resolver;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Field group name.
pub const NAME: &str = regcheck_storage::FIELD_GROUP;
/// Preference list key.
pub const PREFERENCE_KEY: &str = "DISTRIBUTED_STORAGE_PREFERENCE";
/// Default locations key.
pub const DEFAULT_LOCATIONS_KEY: &str = "DISTRIBUTED_STORAGE_DEFAULT_LOCATIONS";
/// Replication feature flag.
pub const REPLICATION_KEY: &str = "FEATURE_STORAGE_REPLICATION";
/// Keys owned by this group.
pub const FIELDS: &[&str] = &[
    STORAGE_CONFIG_KEY,
    PREFERENCE_KEY,
    DEFAULT_LOCATIONS_KEY,
    REPLICATION_KEY,
    "FEATURE_PROXY_STORAGE",
];

// ============================================================================
// SECTION: Types
// ============================================================================

/// Distributed storage settings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DistributedStorage {
    /// Entries in name order.
    pub entries: Vec<StorageEntry>,
    /// Preferred storage names.
    pub preference: Vec<String>,
    /// Default replication targets.
    pub default_locations: Vec<String>,
    /// Storage replication enabled.
    pub replication: bool,
    /// Proxy blob downloads through the registry.
    pub proxy_storage: bool,
}

impl DistributedStorage {
    /// Decodes the group.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Construction`] for mistyped values or malformed entries.
    pub fn from_raw(raw: &RawConfig) -> Result<Self, ConfigError> {
        let entries = match raw.get(STORAGE_CONFIG_KEY) {
            Some(value) => parse_storage_config(value)?,
            None => Vec::new(),
        };
        Ok(Self {
            entries,
            preference: raw.decode_or_default(PREFERENCE_KEY)?,
            default_locations: raw.decode_or_default(DEFAULT_LOCATIONS_KEY)?,
            replication: raw.decode_or(REPLICATION_KEY, false)?,
            proxy_storage: raw.decode_or("FEATURE_PROXY_STORAGE", false)?,
        })
    }

    /// Returns true when an entry with this name exists.
    fn defines(&self, name: &str) -> bool {
        self.entries.iter().any(|entry| entry.name == name)
    }

    /// One finding per distinct name missing from the storage mapping.
    fn missing_references(&self, key: &str, names: &[String]) -> Vec<Finding> {
        let mut seen = BTreeSet::new();
        names
            .iter()
            .filter(|name| seen.insert(name.as_str()))
            .filter(|name| !self.defines(name))
            .map(|name| {
                Finding::error(NAME, key, format!("{key} references `{name}`, which is not defined in {STORAGE_CONFIG_KEY}"))
            })
            .collect()
    }

    /// Structural rules.
    #[must_use]
    pub fn check(&self, certificates: &Certificates) -> Vec<Finding> {
        let mut findings = Vec::new();
        for entry in &self.entries {
            findings.extend(resolver::check(entry, certificates));
        }
        findings.extend(self.missing_references(PREFERENCE_KEY, &self.preference));
        findings.extend(self.missing_references(DEFAULT_LOCATIONS_KEY, &self.default_locations));
        if self.replication {
            let local: Vec<&str> = self
                .entries
                .iter()
                .filter(|entry| entry.driver.driver() == Some(StorageDriver::Local))
                .map(|entry| entry.name.as_str())
                .collect();
            if !local.is_empty() {
                findings.push(Finding::error(
                    NAME,
                    REPLICATION_KEY,
                    format!("storage replication cannot be used with LocalStorage (entries: {})", local.join(", ")),
                ));
            }
        }
        findings
    }

    /// Probes every entry in name order.
    pub async fn probe(&self, options: &ValidationOptions) -> Vec<Finding> {
        let mut findings = Vec::new();
        for entry in &self.entries {
            findings.extend(resolver::probe(entry, options).await);
        }
        findings
    }
}
