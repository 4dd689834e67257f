// crates/regcheck-storage/src/live/broker.rs
// ============================================================================
// Module: AWS Credential Broker
// Description: Instance metadata and STS AssumeRole via aws-config providers.
// Purpose: Turn credential plans into short-lived keys for bucket probes.
// Dependencies: aws-config, aws-sdk-s3, regcheck-core
// ============================================================================

//! ## Overview
//! The broker never consults the default provider chain. Each call builds
//! exactly one provider from the plan:
//! - instance role: IMDS credentials provider;
//! - web identity: `AssumeRoleWithWebIdentity` with a static token file;
//! - user keys: `AssumeRole` signed with the configured STS user keys.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use aws_config::imds::credentials::ImdsCredentialsProvider;
use aws_config::provider_config::ProviderConfig;
use aws_config::sts::AssumeRoleProvider;
use aws_config::web_identity_token::StaticConfiguration;
use aws_config::web_identity_token::WebIdentityTokenCredentialsProvider;
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::config::ProvideCredentials;
use aws_sdk_s3::config::Region;
use regcheck_core::AssumeRoleRequest;
use regcheck_core::CredentialBroker;
use regcheck_core::ProbeError;
use regcheck_core::RoleIdentity;
use regcheck_core::StaticCredentials;

// ============================================================================
// SECTION: Broker
// ============================================================================

/// Provider name attached to user keys handed to STS.
const SOURCE_PROVIDER_NAME: &str = "regcheck-sts-user";

/// Credential broker backed by aws-config providers.
#[derive(Debug, Clone, Copy, Default)]
pub struct AwsCredentialBroker;

impl AwsCredentialBroker {
    /// Creates a broker.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

/// Resolves a provider into static credentials.
async fn fetch(provider: &impl ProvideCredentials) -> Result<StaticCredentials, ProbeError> {
    let credentials = provider
        .provide_credentials()
        .await
        .map_err(|err| ProbeError::Rejected(err.to_string()))?;
    Ok(StaticCredentials {
        access_key_id: credentials.access_key_id().to_string(),
        secret_access_key: credentials.secret_access_key().to_string(),
        session_token: credentials.session_token().map(str::to_string),
    })
}

#[async_trait]
impl CredentialBroker for AwsCredentialBroker {
    async fn instance_role(&self, _region: &str) -> Result<StaticCredentials, ProbeError> {
        let provider = ImdsCredentialsProvider::builder().build();
        fetch(&provider).await
    }

    async fn assume_role(&self, request: &AssumeRoleRequest) -> Result<StaticCredentials, ProbeError> {
        let region = Region::new(request.region.clone());
        match &request.identity {
            RoleIdentity::WebIdentityTokenFile(path) => {
                let provider_config = ProviderConfig::without_region().with_region(Some(region));
                let provider = WebIdentityTokenCredentialsProvider::builder()
                    .static_configuration(StaticConfiguration {
                        web_identity_token_file: PathBuf::from(path),
                        role_arn: request.role_arn.clone(),
                        session_name: request.session_name.clone(),
                    })
                    .configure(&provider_config)
                    .build();
                fetch(&provider).await
            }
            RoleIdentity::UserKeys(keys) => {
                let source = Credentials::new(
                    keys.access_key_id.clone(),
                    keys.secret_access_key.clone(),
                    keys.session_token.clone(),
                    None,
                    SOURCE_PROVIDER_NAME,
                );
                let seconds = u64::try_from(request.duration_secs).unwrap_or(0);
                let provider = AssumeRoleProvider::builder(request.role_arn.clone())
                    .session_name(request.session_name.clone())
                    .session_length(Duration::from_secs(seconds))
                    .region(region)
                    .build_from_provider(source)
                    .await;
                fetch(&provider).await
            }
        }
    }
}
