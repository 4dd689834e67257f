// crates/regcheck-storage/src/entry.rs
// ============================================================================
// Module: Storage Entries
// Description: Closed driver enum and strictly decoded storage parameters.
// Purpose: Turn `[driver, {params}]` pairs into typed storage entries.
// Dependencies: regcheck-core, serde, serde_json
// ============================================================================

//! ## Overview
//! `DISTRIBUTED_STORAGE_CONFIG` maps a user-chosen name to a two-element
//! sequence: a driver tag and a parameter object. Known tags decode into
//! [`StorageDriver`]; anything else is kept as [`StorageDriverTag::Unknown`]
//! so the resolver can report it as an error finding. Parameter values that
//! fail their declared type are construction errors.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;

use regcheck_core::ConfigError;
use regcheck_core::document::decode_value;
use serde::Deserialize;
use serde_json::Map;
use serde_json::Value;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Top-level key holding every storage entry.
pub const STORAGE_CONFIG_KEY: &str = "DISTRIBUTED_STORAGE_CONFIG";

// ============================================================================
// SECTION: Drivers
// ============================================================================

/// Supported storage drivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StorageDriver {
    /// Local filesystem.
    Local,
    /// Ceph RADOS gateway (S3-compatible).
    RadosGw,
    /// OpenShift Container Storage (S3-compatible).
    Rhocs,
    /// IBM Cloud Object Storage (S3-compatible).
    IbmCloud,
    /// Amazon S3 with static keys or an instance role.
    S3,
    /// Amazon S3 through IRSA web identity federation.
    IrsaS3,
    /// Amazon S3 through STS AssumeRole.
    StsS3,
    /// Google Cloud Storage (S3 interoperability API).
    GoogleCloud,
    /// Azure Blob storage.
    Azure,
    /// Amazon S3 fronted by CloudFront.
    CloudFrontS3,
    /// OpenStack Swift.
    Swift,
    /// S3 fronted by CloudFlare.
    CloudFlareS3,
    /// Composite of several CDN-fronted providers.
    MultiCdn,
}

impl StorageDriver {
    /// Every driver in declaration order.
    pub const ALL: [Self; 13] = [
        Self::Local,
        Self::RadosGw,
        Self::Rhocs,
        Self::IbmCloud,
        Self::S3,
        Self::IrsaS3,
        Self::StsS3,
        Self::GoogleCloud,
        Self::Azure,
        Self::CloudFrontS3,
        Self::Swift,
        Self::CloudFlareS3,
        Self::MultiCdn,
    ];

    /// Returns the configuration tag for this driver.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Local => "LocalStorage",
            Self::RadosGw => "RadosGWStorage",
            Self::Rhocs => "RHOCSStorage",
            Self::IbmCloud => "IBMCloudStorage",
            Self::S3 => "S3Storage",
            Self::IrsaS3 => "IRSAS3Storage",
            Self::StsS3 => "STSS3Storage",
            Self::GoogleCloud => "GoogleCloudStorage",
            Self::Azure => "AzureStorage",
            Self::CloudFrontS3 => "CloudFrontedS3Storage",
            Self::Swift => "SwiftStorage",
            Self::CloudFlareS3 => "CloudFlareStorage",
            Self::MultiCdn => "MultiCDNStorage",
        }
    }

    /// Parses a configuration tag.
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|driver| driver.tag() == tag)
    }
}

impl fmt::Display for StorageDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Driver tag as written in the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageDriverTag {
    /// Recognized driver.
    Known(StorageDriver),
    /// Unrecognized tag, reported as an error finding.
    Unknown(String),
}

impl StorageDriverTag {
    /// Classifies a raw tag.
    #[must_use]
    pub fn parse(tag: &str) -> Self {
        StorageDriver::from_tag(tag).map_or_else(|| Self::Unknown(tag.to_string()), Self::Known)
    }

    /// Returns the known driver, if any.
    #[must_use]
    pub const fn driver(&self) -> Option<StorageDriver> {
        match self {
            Self::Known(driver) => Some(*driver),
            Self::Unknown(_) => None,
        }
    }
}

// ============================================================================
// SECTION: Parameters
// ============================================================================

/// Swift `os_options` bag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SwiftOsOptions {
    /// Keystone v3 user domain name.
    pub user_domain_name: Option<String>,
    /// Keystone project (tenant) id.
    pub tenant_id: Option<String>,
    /// Options the validator does not interpret.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Driver parameters; each driver reads the subset it declares.
#[derive(Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct StorageParams {
    /// Local or object key prefix.
    pub storage_path: Option<String>,
    /// S3-compatible access key.
    pub access_key: Option<String>,
    /// S3-compatible secret key.
    pub secret_key: Option<String>,
    /// S3-compatible gateway host name.
    pub hostname: Option<String>,
    /// S3-compatible bucket name.
    pub bucket_name: Option<String>,
    /// Whether the S3-compatible gateway uses TLS.
    pub is_secure: Option<bool>,
    /// Gateway or S3 host port.
    #[serde(deserialize_with = "regcheck_core::document::flexible_int")]
    pub port: Option<i64>,
    /// AWS access key.
    pub s3_access_key: Option<String>,
    /// AWS secret key.
    pub s3_secret_key: Option<String>,
    /// AWS bucket.
    pub s3_bucket: Option<String>,
    /// AWS region.
    pub s3_region: Option<String>,
    /// Legacy S3 host override.
    pub host: Option<String>,
    /// Endpoint URL override (scheme included).
    pub endpoint_url: Option<String>,
    /// STS role ARN.
    pub sts_role_arn: Option<String>,
    /// STS role session name.
    pub sts_role_session_name: Option<String>,
    /// STS user access key.
    pub sts_user_access_key: Option<String>,
    /// STS user secret key.
    pub sts_user_secret_key: Option<String>,
    /// STS web identity token file.
    pub sts_web_identity_token_file: Option<String>,
    /// CloudFront distribution domain.
    pub cloudfront_distribution_domain: Option<String>,
    /// CloudFront key pair id.
    pub cloudfront_key_id: Option<String>,
    /// CloudFront private key file in the certificate bundle.
    pub cloudfront_privatekey_filename: Option<String>,
    /// CloudFlare domain.
    pub cloudflare_domain: Option<String>,
    /// Azure container.
    pub azure_container: Option<String>,
    /// Azure account name.
    pub azure_account_name: Option<String>,
    /// Azure account key.
    pub azure_account_key: Option<String>,
    /// Azure SAS token.
    pub sas_token: Option<String>,
    /// Swift auth version.
    #[serde(deserialize_with = "regcheck_core::document::flexible_int")]
    pub auth_version: Option<i64>,
    /// Swift identity endpoint.
    pub auth_url: Option<String>,
    /// Swift container.
    pub swift_container: Option<String>,
    /// Swift user.
    pub swift_user: Option<String>,
    /// Swift password.
    pub swift_password: Option<String>,
    /// Swift CA certificate file in the certificate bundle.
    pub ca_cert_path: Option<String>,
    /// Swift temp URL key.
    pub temp_url_key: Option<String>,
    /// Swift `os_options` bag.
    pub os_options: Option<SwiftOsOptions>,
    /// Multi-CDN provider definitions.
    pub providers: Option<Map<String, Value>>,
    /// Multi-CDN default provider name.
    pub default_provider: Option<String>,
    /// Multi-CDN underlying storage.
    pub storage_config: Option<Map<String, Value>>,
}

impl fmt::Debug for StorageParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageParams")
            .field("hostname", &self.hostname)
            .field("host", &self.host)
            .field("endpoint_url", &self.endpoint_url)
            .field("bucket_name", &self.bucket_name)
            .field("s3_bucket", &self.s3_bucket)
            .field("azure_container", &self.azure_container)
            .field("swift_container", &self.swift_container)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// SECTION: Entries
// ============================================================================

/// One named storage location.
#[derive(Debug, Clone, PartialEq)]
pub struct StorageEntry {
    /// User-chosen location name.
    pub name: String,
    /// Driver tag.
    pub driver: StorageDriverTag,
    /// Driver parameters.
    pub params: StorageParams,
}

impl StorageEntry {
    /// Builds an entry for a known driver.
    #[must_use]
    pub fn new(name: impl Into<String>, driver: StorageDriver, params: StorageParams) -> Self {
        Self {
            name: name.into(),
            driver: StorageDriverTag::Known(driver),
            params,
        }
    }

    /// Decodes one `[driver, {params}]` pair.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Construction`] when the value is not a
    /// two-element sequence of a string and an object, or when a parameter
    /// fails its declared type.
    pub fn from_value(name: &str, value: &Value) -> Result<Self, ConfigError> {
        let key = format!("{STORAGE_CONFIG_KEY}.{name}");
        let Value::Array(items) = value else {
            return Err(ConfigError::construction(key, "expected a [driver, parameters] sequence"));
        };
        let [tag, params] = items.as_slice() else {
            return Err(ConfigError::construction(key, "expected exactly two elements"));
        };
        let Value::String(tag) = tag else {
            return Err(ConfigError::construction(key, "driver must be a string"));
        };
        let params = match params {
            Value::Null => StorageParams::default(),
            Value::Object(_) => decode_value(&key, params)?,
            _ => return Err(ConfigError::construction(key, "parameters must be an object")),
        };
        Ok(Self {
            name: name.to_string(),
            driver: StorageDriverTag::parse(tag),
            params,
        })
    }

    /// Dotted path for a parameter of this entry.
    #[must_use]
    pub fn path(&self, param: &str) -> String {
        format!("{STORAGE_CONFIG_KEY}.{}.{param}", self.name)
    }

    /// Dotted path of the entry itself.
    #[must_use]
    pub fn entry_path(&self) -> String {
        format!("{STORAGE_CONFIG_KEY}.{}", self.name)
    }
}

/// Decodes the full storage mapping in name order.
///
/// # Errors
///
/// Returns [`ConfigError::Construction`] when the mapping or any entry is malformed.
pub fn parse_storage_config(value: &Value) -> Result<Vec<StorageEntry>, ConfigError> {
    let Value::Object(map) = value else {
        return Err(ConfigError::construction(STORAGE_CONFIG_KEY, "expected a mapping of storage entries"));
    };
    let ordered: BTreeMap<&String, &Value> = map.iter().collect();
    ordered.into_iter().map(|(name, value)| StorageEntry::from_value(name, value)).collect()
}
