// crates/regcheck-storage/src/live/s3.rs
// ============================================================================
// Module: S3 Bucket Probe
// Description: HeadBucket against S3-dialect endpoints via aws-sdk-s3.
// Purpose: Confirm a bucket exists with exactly the resolved credentials.
// Dependencies: aws-sdk-s3, regcheck-core
// ============================================================================

//! ## Overview
//! A fresh client is built per request from the resolved credentials; no
//! ambient credential provider is consulted, so the probe exercises exactly
//! the identity the credential chain chose.

// ============================================================================
// SECTION: Imports
// ============================================================================

use aws_sdk_s3::Client;
use aws_sdk_s3::config::BehaviorVersion;
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::config::timeout::TimeoutConfig;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::error::SdkError;
use regcheck_core::BucketRequest;
use regcheck_core::ProbeError;
use regcheck_core::ProbeTimeouts;

// ============================================================================
// SECTION: Probe
// ============================================================================

/// Provider name attached to probe credentials.
const PROVIDER_NAME: &str = "regcheck-resolved";

/// Builds a client bound to the request's endpoint and credentials.
fn client_for(request: &BucketRequest, timeouts: ProbeTimeouts) -> Client {
    let credentials = Credentials::new(
        request.credentials.access_key_id.clone(),
        request.credentials.secret_access_key.clone(),
        request.credentials.session_token.clone(),
        None,
        PROVIDER_NAME,
    );
    let timeout_config = TimeoutConfig::builder()
        .connect_timeout(timeouts.connect)
        .operation_timeout(timeouts.request)
        .build();
    let mut builder = aws_sdk_s3::config::Builder::new()
        .behavior_version(BehaviorVersion::latest())
        .region(Region::new(request.region.clone()))
        .credentials_provider(credentials)
        .timeout_config(timeout_config);
    if let Some(endpoint) = &request.endpoint {
        builder = builder.endpoint_url(endpoint.clone());
    }
    if request.force_path_style {
        builder = builder.force_path_style(true);
    }
    Client::from_conf(builder.build())
}

/// Issues HeadBucket for the requested bucket.
pub(crate) async fn head_bucket(request: &BucketRequest, timeouts: ProbeTimeouts) -> Result<(), ProbeError> {
    let client = client_for(request, timeouts);
    match client.head_bucket().bucket(&request.bucket).send().await {
        Ok(_) => Ok(()),
        Err(SdkError::ServiceError(context)) => {
            if context.err().is_not_found() {
                return Err(ProbeError::NotFound(format!("bucket {}", request.bucket)));
            }
            let status = context.raw().status().as_u16();
            Err(ProbeError::Rejected(format!("HeadBucket returned status {status}")))
        }
        Err(SdkError::TimeoutError(_)) => Err(ProbeError::Timeout(timeouts.request.as_millis())),
        Err(err) => Err(ProbeError::Transport(DisplayErrorContext(&err).to_string())),
    }
}
