// crates/regcheck-config/src/config.rs
// ============================================================================
// Module: Registry Config
// Description: Typed configuration assembled from field groups.
// Purpose: Decode a raw document once, strictly, into every field group.
// Dependencies: regcheck-core
// ============================================================================

//! ## Overview
//! [`RegistryConfig`] decodes every [`FieldGroup`] in order. The first
//! mistyped value aborts construction. Keys no group owns are kept aside
//! and reported by [`RegistryConfig::unknown_keys`], never validated.

// ============================================================================
// SECTION: Imports
// ============================================================================

use regcheck_core::ConfigError;
use regcheck_core::RawConfig;

use crate::bundle::ConfigBundle;
use crate::field_groups::FieldGroup;
use crate::field_groups::FieldGroupConfig;

// ============================================================================
// SECTION: Registry Config
// ============================================================================

/// Fully decoded configuration document.
#[derive(Debug, Clone, PartialEq)]
pub struct RegistryConfig {
    /// Raw document the groups were decoded from.
    document: RawConfig,
    /// Decoded groups in validation order.
    groups: Vec<FieldGroupConfig>,
}

impl RegistryConfig {
    /// Decodes every field group from a raw document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Construction`] for the first mistyped value.
    pub fn from_raw(document: RawConfig) -> Result<Self, ConfigError> {
        let groups = FieldGroup::ALL.iter().map(|group| group.construct(&document)).collect::<Result<_, _>>()?;
        Ok(Self {
            document,
            groups,
        })
    }

    /// Decodes the document of a loaded bundle.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Construction`] for the first mistyped value.
    pub fn from_bundle(bundle: &ConfigBundle) -> Result<Self, ConfigError> {
        Self::from_raw(bundle.document.clone())
    }

    /// Parses and decodes a YAML or JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the text does not parse or a value is mistyped.
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        Self::from_raw(RawConfig::from_yaml_str(text)?)
    }

    /// Raw document.
    #[must_use]
    pub const fn document(&self) -> &RawConfig {
        &self.document
    }

    /// Decoded groups in validation order.
    #[must_use]
    pub fn groups(&self) -> &[FieldGroupConfig] {
        &self.groups
    }

    /// Decoded instance of one group.
    #[must_use]
    pub fn group(&self, group: FieldGroup) -> Option<&FieldGroupConfig> {
        self.groups.iter().find(|decoded| decoded.group() == group)
    }

    /// Top-level keys owned by no field group, sorted.
    #[must_use]
    pub fn unknown_keys(&self) -> Vec<String> {
        self.document
            .keys()
            .filter(|key| !FieldGroup::ALL.iter().any(|group| group.owns(&self.document, key)))
            .filter(|key| !crate::required::owns(key))
            .map(str::to_string)
            .collect()
    }
}
