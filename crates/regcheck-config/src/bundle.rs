// crates/regcheck-config/src/bundle.rs
// ============================================================================
// Module: Configuration Bundle
// Description: Loads a config document and its certificate side channel.
// Purpose: Turn an operator-supplied directory into validated input.
// Dependencies: regcheck-core
// ============================================================================

//! ## Overview
//! A bundle directory holds `config.yaml` (or `config.json`) plus any number
//! of certificate and key files, possibly nested. Every non-config regular
//! file becomes an entry in [`Certificates`], keyed by its path relative to
//! the bundle root with `/` separators.
//!
//! Security posture: bundle contents are untrusted; sizes and file counts
//! are bounded and symbolic links are not followed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;

use regcheck_core::Certificates;
use regcheck_core::ConfigError;
use regcheck_core::RawConfig;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum config document size in bytes.
pub const MAX_CONFIG_FILE_SIZE: u64 = 1024 * 1024;
/// Maximum certificate file size in bytes.
pub const MAX_CERTIFICATE_FILE_SIZE: u64 = 256 * 1024;
/// Maximum number of files in a bundle, config included.
pub const MAX_BUNDLE_FILES: usize = 256;
/// Config document names, in lookup order.
pub const CONFIG_FILE_NAMES: [&str; 2] = ["config.yaml", "config.json"];
/// Directory the registry mounts the bundle at; references may carry it.
pub const MOUNT_PREFIX: &str = "conf/stack/";

// ============================================================================
// SECTION: Bundle
// ============================================================================

/// Parsed configuration document plus certificate material.
#[derive(Debug, Clone, Default)]
pub struct ConfigBundle {
    /// Top-level document.
    pub document: RawConfig,
    /// Certificate side channel.
    pub certificates: Certificates,
}

impl ConfigBundle {
    /// Loads a bundle directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when no config document exists, a limit is
    /// exceeded, a file cannot be read, or the document does not parse.
    pub fn load(dir: &Path) -> Result<Self, ConfigError> {
        let config_name = CONFIG_FILE_NAMES
            .iter()
            .find(|name| dir.join(name).is_file())
            .ok_or_else(|| ConfigError::Io(format!("no config.yaml or config.json in {}", dir.display())))?;
        let text = read_bounded(&dir.join(config_name), MAX_CONFIG_FILE_SIZE)?;
        let text = String::from_utf8(text)
            .map_err(|_| ConfigError::Invalid(format!("{config_name} must be utf-8")))?;
        let mut certificates = Certificates::new();
        let mut count = 1;
        collect_files(dir, dir, config_name, &mut certificates, &mut count)?;
        Self::from_parts(&text, certificates)
    }

    /// Builds a bundle from in-memory parts.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the document does not parse as a mapping.
    pub fn from_parts(document_text: &str, certificates: Certificates) -> Result<Self, ConfigError> {
        Ok(Self {
            document: RawConfig::from_yaml_str(document_text)?,
            certificates,
        })
    }
}

/// Normalizes a configured file reference to a bundle key.
///
/// Leading `/` and the `conf/stack/` mount prefix are stripped so that both
/// `/conf/stack/database.pem` and `database.pem` name the same file.
#[must_use]
pub fn bundle_relative(reference: &str) -> &str {
    let trimmed = reference.trim().trim_start_matches('/');
    trimmed.strip_prefix(MOUNT_PREFIX).unwrap_or(trimmed)
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Reads a file, rejecting anything over `limit` bytes.
fn read_bounded(path: &Path, limit: u64) -> Result<Vec<u8>, ConfigError> {
    let meta = fs::metadata(path).map_err(|err| ConfigError::Io(format!("{}: {err}", path.display())))?;
    if meta.len() > limit {
        return Err(ConfigError::Invalid(format!("{} exceeds size limit", path.display())));
    }
    fs::read(path).map_err(|err| ConfigError::Io(format!("{}: {err}", path.display())))
}

/// Walks `dir`, adding every regular file except the config document.
fn collect_files(
    root: &Path,
    dir: &Path,
    config_name: &str,
    certificates: &mut Certificates,
    count: &mut usize,
) -> Result<(), ConfigError> {
    let mut entries: Vec<_> = fs::read_dir(dir)
        .map_err(|err| ConfigError::Io(format!("{}: {err}", dir.display())))?
        .collect::<Result<_, _>>()
        .map_err(|err| ConfigError::Io(format!("{}: {err}", dir.display())))?;
    entries.sort_by_key(fs::DirEntry::file_name);
    for entry in entries {
        let path = entry.path();
        let file_type = entry.file_type().map_err(|err| ConfigError::Io(format!("{}: {err}", path.display())))?;
        if file_type.is_dir() {
            collect_files(root, &path, config_name, certificates, count)?;
            continue;
        }
        if !file_type.is_file() {
            continue;
        }
        let Ok(relative) = path.strip_prefix(root) else {
            continue;
        };
        let key = relative.components().map(|part| part.as_os_str().to_string_lossy()).collect::<Vec<_>>().join("/");
        if key == config_name {
            continue;
        }
        *count += 1;
        if *count > MAX_BUNDLE_FILES {
            return Err(ConfigError::Invalid(format!("bundle holds more than {MAX_BUNDLE_FILES} files")));
        }
        let bytes = read_bounded(&path, MAX_CERTIFICATE_FILE_SIZE)?;
        certificates.insert(key, bytes);
    }
    Ok(())
}
