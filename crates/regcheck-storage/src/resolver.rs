// crates/regcheck-storage/src/resolver.rs
// ============================================================================
// Module: Storage Backend Resolver
// Description: Structural checks and one live probe per storage entry.
// Purpose: Turn a storage entry into findings behind a single call shape.
// Dependencies: regcheck-core, crate::entry, crate::credentials, crate::endpoint
// ============================================================================

//! ## Overview
//! [`check`] applies every document-level rule for an entry and reports all
//! violations at once. [`probe`] re-runs [`check`] and stops there when it
//! found anything: a probe is never attempted with known-incomplete
//! parameters. Otherwise it resolves credentials through the driver's chain,
//! realizes them, and issues exactly one bounded call against the backend.
//! Every failure along that path becomes exactly one finding.
//!
//! Local, CloudFlare and multi-CDN entries are structural only.

// ============================================================================
// SECTION: Imports
// ============================================================================

use regcheck_core::AzureContainerRequest;
use regcheck_core::BucketRequest;
use regcheck_core::Certificates;
use regcheck_core::Finding;
use regcheck_core::ProbeError;
use regcheck_core::SwiftAuthVersion;
use regcheck_core::SwiftContainerRequest;
use regcheck_core::ValidationOptions;
use regcheck_core::environment::ENV_REGION;
use regcheck_core::rules;
use regcheck_core::runtime::bounded;

use crate::credentials;
use crate::credentials::CredentialContext;
use crate::endpoint;
use crate::endpoint::Endpoint;
use crate::entry::StorageDriver;
use crate::entry::StorageDriverTag;
use crate::entry::StorageEntry;
use crate::entry::StorageParams;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Field group name attached to storage findings.
pub const FIELD_GROUP: &str = "DistributedStorage";

// ============================================================================
// SECTION: Structural Checks
// ============================================================================

/// Collects required-parameter findings for an entry.
struct Requirements<'a> {
    /// Entry under check.
    entry: &'a StorageEntry,
    /// Findings so far.
    findings: Vec<Finding>,
}

impl<'a> Requirements<'a> {
    /// Starts an empty collection.
    const fn new(entry: &'a StorageEntry) -> Self {
        Self {
            entry,
            findings: Vec::new(),
        }
    }

    /// Requires a non-blank string parameter.
    fn string(&mut self, param: &str, value: Option<&String>) -> &mut Self {
        let path = self.entry.path(param);
        self.findings.extend(rules::require_string(FIELD_GROUP, &path, value.map(String::as_str)));
        self
    }

    /// Requires a non-empty object parameter.
    fn object(&mut self, param: &str, value: Option<&serde_json::Map<String, serde_json::Value>>) -> &mut Self {
        if value.is_none_or(|map| map.is_empty()) {
            let path = self.entry.path(param);
            self.findings.push(Finding::error(FIELD_GROUP, &path, format!("{path} must be a non-empty object")));
        }
        self
    }

    /// Requires a bundle file when the parameter names one.
    fn certificate(&mut self, param: &str, value: Option<&String>, certificates: &Certificates) -> &mut Self {
        if let Some(name) = value.map(|name| name.trim()).filter(|name| !name.is_empty()) {
            let path = self.entry.path(param);
            self.findings.extend(rules::certificate_present(FIELD_GROUP, &path, certificates, name));
        }
        self
    }

    /// Adds a custom finding.
    fn push(&mut self, param: &str, message: String) -> &mut Self {
        self.findings.push(Finding::error(FIELD_GROUP, self.entry.path(param), message));
        self
    }

    /// Returns the findings.
    fn finish(&mut self) -> Vec<Finding> {
        std::mem::take(&mut self.findings)
    }
}

/// Applies every document-level rule for one entry.
///
/// Never performs I/O. An unrecognized driver tag yields a single error.
#[must_use]
pub fn check(entry: &StorageEntry, certificates: &Certificates) -> Vec<Finding> {
    let driver = match &entry.driver {
        StorageDriverTag::Known(driver) => *driver,
        StorageDriverTag::Unknown(tag) => {
            return vec![Finding::error(
                FIELD_GROUP,
                entry.entry_path(),
                format!("`{tag}` is not a valid storage driver"),
            )];
        }
    };
    let params = &entry.params;
    let mut req = Requirements::new(entry);
    match driver {
        StorageDriver::Local => {}
        StorageDriver::RadosGw | StorageDriver::Rhocs | StorageDriver::IbmCloud => {
            req.string("access_key", params.access_key.as_ref())
                .string("secret_key", params.secret_key.as_ref())
                .string("hostname", params.hostname.as_ref())
                .string("bucket_name", params.bucket_name.as_ref());
            check_port(&mut req, params);
        }
        StorageDriver::S3 | StorageDriver::IrsaS3 | StorageDriver::StsS3 => {
            req.string("s3_bucket", params.s3_bucket.as_ref());
            check_half_keys(&mut req, params);
            check_port(&mut req, params);
        }
        StorageDriver::GoogleCloud => {
            req.string("access_key", params.access_key.as_ref())
                .string("secret_key", params.secret_key.as_ref())
                .string("bucket_name", params.bucket_name.as_ref());
        }
        StorageDriver::Azure => {
            req.string("azure_container", params.azure_container.as_ref())
                .string("azure_account_name", params.azure_account_name.as_ref());
        }
        StorageDriver::CloudFrontS3 => {
            req.string("s3_bucket", params.s3_bucket.as_ref())
                .string("cloudfront_distribution_domain", params.cloudfront_distribution_domain.as_ref())
                .string("cloudfront_key_id", params.cloudfront_key_id.as_ref())
                .certificate(
                    "cloudfront_privatekey_filename",
                    params.cloudfront_privatekey_filename.as_ref(),
                    certificates,
                );
            check_half_keys(&mut req, params);
            check_port(&mut req, params);
        }
        StorageDriver::Swift => check_swift(&mut req, params, certificates),
        StorageDriver::CloudFlareS3 => {
            req.string("s3_access_key", params.s3_access_key.as_ref())
                .string("s3_secret_key", params.s3_secret_key.as_ref())
                .string("s3_bucket", params.s3_bucket.as_ref())
                .string("cloudflare_domain", params.cloudflare_domain.as_ref());
        }
        StorageDriver::MultiCdn => {
            req.object("providers", params.providers.as_ref())
                .string("default_provider", params.default_provider.as_ref())
                .object("storage_config", params.storage_config.as_ref());
            if let (Some(providers), Some(default)) = (&params.providers, &params.default_provider)
                && !providers.is_empty()
                && !default.trim().is_empty()
                && !providers.contains_key(default)
            {
                req.push(
                    "default_provider",
                    format!("default provider `{default}` is not defined in {}", entry.path("providers")),
                );
            }
        }
    }
    req.finish()
}

/// Returns true when a string parameter is absent or blank.
fn blank(value: Option<&String>) -> bool {
    value.is_none_or(|value| value.trim().is_empty())
}

/// Flags a configured port outside the TCP range.
fn check_port(req: &mut Requirements<'_>, params: &StorageParams) {
    if let Some(port) = params.port.filter(|port| *port != 0) {
        let path = req.entry.path("port");
        req.findings.extend(rules::port(FIELD_GROUP, &path, port));
    }
}

/// Flags a static key configured without its partner.
fn check_half_keys(req: &mut Requirements<'_>, params: &StorageParams) {
    match (blank(params.s3_access_key.as_ref()), blank(params.s3_secret_key.as_ref())) {
        (false, true) => {
            req.string("s3_secret_key", params.s3_secret_key.as_ref());
        }
        (true, false) => {
            req.string("s3_access_key", params.s3_access_key.as_ref());
        }
        _ => {}
    }
}

/// Swift rules, including the v3 `os_options` requirements.
fn check_swift(req: &mut Requirements<'_>, params: &StorageParams, certificates: &Certificates) {
    match params.auth_version {
        None => {
            let path = req.entry.path("auth_version");
            req.push("auth_version", format!("{path} is required"));
        }
        Some(version) if SwiftAuthVersion::from_number(version).is_none() => {
            req.push("auth_version", format!("auth_version must be 1, 2, or 3 (got {version})"));
        }
        Some(_) => {}
    }
    req.string("auth_url", params.auth_url.as_ref())
        .string("swift_container", params.swift_container.as_ref())
        .string("swift_user", params.swift_user.as_ref())
        .string("swift_password", params.swift_password.as_ref())
        .certificate("ca_cert_path", params.ca_cert_path.as_ref(), certificates);
    if params.auth_version == Some(3) {
        let options = params.os_options.clone().unwrap_or_default();
        if blank(options.user_domain_name.as_ref()) {
            req.push("os_options.user_domain_name", "Swift auth v3 requires user_domain_name in os_options".to_string());
        }
        if blank(options.tenant_id.as_ref()) {
            req.push("os_options.tenant_id", "Swift auth v3 requires tenant_id in os_options".to_string());
        }
    }
}

// ============================================================================
// SECTION: Live Probe
// ============================================================================

/// Checks an entry, then probes its backend once.
///
/// Returns the structural findings unchanged when there are any. Otherwise
/// returns at most one finding describing the first failure. Local,
/// CloudFlare and multi-CDN entries never perform network I/O.
pub async fn probe(entry: &StorageEntry, options: &ValidationOptions) -> Vec<Finding> {
    let structural = check(entry, &options.certificates);
    if !structural.is_empty() {
        return structural;
    }
    let Some(driver) = entry.driver.driver() else {
        return Vec::new();
    };
    let outcome = match driver {
        StorageDriver::Local | StorageDriver::CloudFlareS3 | StorageDriver::MultiCdn => Ok(()),
        StorageDriver::RadosGw | StorageDriver::Rhocs | StorageDriver::IbmCloud => {
            probe_bucket(entry, driver, endpoint::s3_compatible(&entry.params), options).await
        }
        StorageDriver::GoogleCloud => probe_bucket(entry, driver, endpoint::google_cloud(), options).await,
        StorageDriver::S3 | StorageDriver::IrsaS3 | StorageDriver::StsS3 | StorageDriver::CloudFrontS3 => {
            probe_bucket(entry, driver, endpoint::aws_s3(&entry.params), options).await
        }
        StorageDriver::Azure => probe_azure(entry, options).await,
        StorageDriver::Swift => probe_swift(entry, options).await,
    };
    match outcome {
        Ok(()) => Vec::new(),
        Err(message) => vec![Finding::error(FIELD_GROUP, entry.entry_path(), message)],
    }
}

/// Event label for an entry probe.
fn target(entry: &StorageEntry) -> String {
    format!("storage {}", entry.name)
}

/// Signing region for S3-dialect drivers.
fn region(entry: &StorageEntry, options: &ValidationOptions) -> String {
    entry
        .params
        .s3_region
        .as_deref()
        .map(str::trim)
        .filter(|region| !region.is_empty())
        .map(str::to_string)
        .or_else(|| options.environment.var(ENV_REGION))
        .unwrap_or_else(|| options.default_region.clone())
}

/// Bucket name for S3-dialect drivers.
fn bucket(entry: &StorageEntry, driver: StorageDriver) -> String {
    let params = &entry.params;
    let name = match driver {
        StorageDriver::RadosGw | StorageDriver::Rhocs | StorageDriver::IbmCloud | StorageDriver::GoogleCloud => {
            params.bucket_name.as_deref()
        }
        _ => params.s3_bucket.as_deref(),
    };
    name.unwrap_or_default().trim().to_string()
}

/// Resolves credentials, then confirms the bucket exists.
async fn probe_bucket(
    entry: &StorageEntry,
    driver: StorageDriver,
    endpoint: Endpoint,
    options: &ValidationOptions,
) -> Result<(), String> {
    let region = region(entry, options);
    let ctx = CredentialContext {
        params: &entry.params,
        environment: &options.environment,
        region: &region,
    };
    let resolved = credentials::resolve(credentials::chain_for(driver), &ctx)
        .map_err(|exhausted| exhausted_message(entry, driver, &exhausted.to_string()))?;
    let strategy = resolved.strategy;
    let broker = options.probes.credentials.clone();
    let label = format!("{} credentials", target(entry));
    let keys = bounded(options, &label, credentials::realize(resolved.plan, broker.as_ref(), &region))
        .await
        .map_err(|err| realize_message(entry, driver, strategy, &err))?;
    let request = BucketRequest {
        endpoint: endpoint.url,
        region,
        bucket: bucket(entry, driver),
        credentials: keys,
        force_path_style: endpoint.force_path_style,
    };
    bounded(options, &target(entry), options.probes.object_store.bucket_exists(&request))
        .await
        .map_err(|err| match err {
            ProbeError::NotFound(_) => {
                format!("could not find bucket ({}) in storage ({})", request.bucket, entry.name)
            }
            other => format!("could not connect to storage {}: {other}", entry.name),
        })
}

/// Message for an exhausted credential chain.
fn exhausted_message(entry: &StorageEntry, driver: StorageDriver, reasons: &str) -> String {
    match driver {
        StorageDriver::StsS3 => {
            format!("could not assume role for storage {} via STS AssumeRole: {reasons}", entry.name)
        }
        StorageDriver::IrsaS3 => {
            format!("could not obtain IRSA credentials for storage {}: {reasons}", entry.name)
        }
        _ => format!("no usable credentials for storage {}: {reasons}", entry.name),
    }
}

/// Message for a failed credential realization.
fn realize_message(entry: &StorageEntry, driver: StorageDriver, strategy: &str, err: &ProbeError) -> String {
    match driver {
        StorageDriver::StsS3 | StorageDriver::IrsaS3 => {
            format!("STS AssumeRole failed for storage {} ({strategy}): {err}", entry.name)
        }
        _ => format!(
            "no access key or secret key were provided for storage {} and fetching the instance role failed: {err}",
            entry.name
        ),
    }
}

/// Fetches Azure container properties.
async fn probe_azure(entry: &StorageEntry, options: &ValidationOptions) -> Result<(), String> {
    let params = &entry.params;
    let account = params.azure_account_name.as_deref().unwrap_or_default().trim().to_string();
    let request = AzureContainerRequest {
        endpoint: endpoint::azure(params, &account),
        account_name: account,
        account_key: params.azure_account_key.clone().filter(|key| !key.trim().is_empty()),
        sas_token: params.sas_token.clone().filter(|token| !token.trim().is_empty()),
        container: params.azure_container.as_deref().unwrap_or_default().trim().to_string(),
    };
    bounded(options, &target(entry), options.probes.object_store.azure_container(&request))
        .await
        .map_err(|err| match err {
            ProbeError::NotFound(_) => {
                format!("could not find container ({}) in Azure storage {}", request.container, entry.name)
            }
            other => format!("could not connect to Azure storage {}: {other}", entry.name),
        })
}

/// Authenticates against Swift and checks the container listing.
async fn probe_swift(entry: &StorageEntry, options: &ValidationOptions) -> Result<(), String> {
    let params = &entry.params;
    let Some(auth_version) = params.auth_version.and_then(SwiftAuthVersion::from_number) else {
        return Err(format!("Swift storage {} has no usable auth_version", entry.name));
    };
    let os_options = params.os_options.clone().unwrap_or_default();
    let ca_pem = params
        .ca_cert_path
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .and_then(|name| options.certificates.get(name))
        .map(<[u8]>::to_vec);
    let request = SwiftContainerRequest {
        auth_url: params.auth_url.as_deref().unwrap_or_default().trim().to_string(),
        auth_version,
        user: params.swift_user.clone().unwrap_or_default(),
        password: params.swift_password.clone().unwrap_or_default(),
        container: params.swift_container.as_deref().unwrap_or_default().trim().to_string(),
        tenant_id: os_options.tenant_id,
        user_domain_name: os_options.user_domain_name,
        ca_pem,
    };
    bounded(options, &target(entry), options.probes.object_store.swift_container(&request))
        .await
        .map_err(|err| match err {
            ProbeError::NotFound(_) => {
                format!("could not find container ({}) in Swift storage {}", request.container, entry.name)
            }
            other => format!("could not connect to Swift storage {}: {other}", entry.name),
        })
}
