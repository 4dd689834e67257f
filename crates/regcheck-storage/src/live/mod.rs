// crates/regcheck-storage/src/live/mod.rs
// ============================================================================
// Module: Live Object Store Probes
// Description: Network-backed ObjectStoreProbe and CredentialBroker.
// Purpose: Provide the production probe implementations for storage entries.
// Dependencies: aws-sdk-s3, aws-config, reqwest
// ============================================================================

//! ## Overview
//! [`LiveObjectStore`] dispatches each request to the backend module for its
//! dialect. HTTP clients are built per call so a per-entry CA certificate
//! can be trusted without leaking into other probes.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod azure;
pub mod broker;
pub(crate) mod s3;
pub(crate) mod swift;

// ============================================================================
// SECTION: Imports
// ============================================================================

use async_trait::async_trait;
use regcheck_core::AzureContainerRequest;
use regcheck_core::BucketRequest;
use regcheck_core::ObjectStoreProbe;
use regcheck_core::ProbeError;
use regcheck_core::ProbeTimeouts;
use regcheck_core::SwiftContainerRequest;
use reqwest::Certificate;
use reqwest::Client;

pub use self::broker::AwsCredentialBroker;

// ============================================================================
// SECTION: HTTP Client
// ============================================================================

/// Builds an HTTP client with probe timeouts and an optional extra CA.
///
/// # Errors
///
/// Returns [`ProbeError::Transport`] when the certificate or client is invalid.
pub fn http_client(timeouts: ProbeTimeouts, ca_pem: Option<&[u8]>) -> Result<Client, ProbeError> {
    let mut builder = Client::builder().connect_timeout(timeouts.connect).timeout(timeouts.request);
    if let Some(pem) = ca_pem {
        let certificate = Certificate::from_pem(pem)
            .map_err(|err| ProbeError::Transport(format!("invalid CA certificate: {err}")))?;
        builder = builder.add_root_certificate(certificate);
    }
    builder.build().map_err(|err| ProbeError::Transport(format!("http client: {err}")))
}

// ============================================================================
// SECTION: Probe
// ============================================================================

/// Object store probe that talks to real endpoints.
#[derive(Debug, Clone, Copy, Default)]
pub struct LiveObjectStore {
    /// Connect and request deadlines.
    timeouts: ProbeTimeouts,
}

impl LiveObjectStore {
    /// Creates a probe with the given deadlines.
    #[must_use]
    pub const fn new(timeouts: ProbeTimeouts) -> Self {
        Self {
            timeouts,
        }
    }
}

#[async_trait]
impl ObjectStoreProbe for LiveObjectStore {
    async fn bucket_exists(&self, request: &BucketRequest) -> Result<(), ProbeError> {
        s3::head_bucket(request, self.timeouts).await
    }

    async fn azure_container(&self, request: &AzureContainerRequest) -> Result<(), ProbeError> {
        let client = http_client(self.timeouts, None)?;
        azure::container_properties(&client, request).await
    }

    async fn swift_container(&self, request: &SwiftContainerRequest) -> Result<(), ProbeError> {
        let client = http_client(self.timeouts, request.ca_pem.as_deref())?;
        swift::container_listed(&client, request).await
    }
}
