// crates/regcheck-core/src/environment.rs
// ============================================================================
// Module: Ambient Environment
// Description: Process environment and token-file access for credential lookup.
// Purpose: Keep ambient reads deterministic and bounded under test.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Credential strategies consult the process environment (role ARN, web
//! identity token path, region). All such reads go through
//! [`AmbientEnvironment`] so a caller can pin them with an override map.
//!
//! # Invariants
//! - When `overrides` is set, the process environment is never consulted.
//! - Token files larger than [`MAX_TOKEN_FILE_BYTES`] are rejected.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fs;
use std::io::Read;
use std::path::Path;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Environment variable naming the role to assume.
pub const ENV_ROLE_ARN: &str = "AWS_ROLE_ARN";
/// Environment variable naming the web identity token file.
pub const ENV_WEB_IDENTITY_TOKEN_FILE: &str = "AWS_WEB_IDENTITY_TOKEN_FILE";
/// Environment variable naming the assumed-role session.
pub const ENV_ROLE_SESSION_NAME: &str = "AWS_ROLE_SESSION_NAME";
/// Environment variable naming the signing region.
pub const ENV_REGION: &str = "AWS_REGION";
/// Maximum web identity token size.
pub const MAX_TOKEN_FILE_BYTES: u64 = 64 * 1024;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Environment reader with optional deterministic overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AmbientEnvironment {
    /// Optional override map used for deterministic lookups.
    pub overrides: Option<BTreeMap<String, String>>,
}

impl AmbientEnvironment {
    /// Reads from the live process environment.
    #[must_use]
    pub const fn process() -> Self {
        Self {
            overrides: None,
        }
    }

    /// Reads only from the supplied map.
    #[must_use]
    pub fn fixed<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            overrides: Some(entries.into_iter().map(|(k, v)| (k.into(), v.into())).collect()),
        }
    }

    /// Returns a non-empty variable value.
    #[must_use]
    pub fn var(&self, key: &str) -> Option<String> {
        let value = match &self.overrides {
            Some(overrides) => overrides.get(key).cloned(),
            None => std::env::var(key).ok(),
        };
        value.filter(|value| !value.trim().is_empty())
    }

    /// Reads a web identity token file.
    ///
    /// # Errors
    ///
    /// Returns a message when the file is missing, unreadable, oversized,
    /// empty, or not UTF-8.
    pub fn read_token_file(&self, path: &str) -> Result<String, String> {
        let path = Path::new(path);
        let file = fs::File::open(path).map_err(|err| format!("{}: {err}", path.display()))?;
        let mut bytes = Vec::new();
        file.take(MAX_TOKEN_FILE_BYTES + 1)
            .read_to_end(&mut bytes)
            .map_err(|err| format!("{}: {err}", path.display()))?;
        if bytes.len() as u64 > MAX_TOKEN_FILE_BYTES {
            return Err(format!("{}: token file exceeds size limit", path.display()));
        }
        let text = String::from_utf8(bytes)
            .map_err(|_| format!("{}: token file must be utf-8", path.display()))?;
        let token = text.trim();
        if token.is_empty() {
            return Err(format!("{}: token file is empty", path.display()));
        }
        Ok(token.to_string())
    }
}
