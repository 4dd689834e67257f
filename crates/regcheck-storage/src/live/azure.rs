// crates/regcheck-storage/src/live/azure.rs
// ============================================================================
// Module: Azure Blob Probe
// Description: Get Container Properties over REST with SharedKey or SAS auth.
// Purpose: Confirm an Azure container is reachable with the configured secret.
// Dependencies: reqwest, hmac, sha2, base64, time, url
// ============================================================================

//! ## Overview
//! Azure has no bucket-exists primitive; the probe issues
//! `GET {endpoint}/{container}?restype=container`. With an account key the
//! request is signed with the SharedKey scheme; with a SAS token the token is
//! appended to the query instead.

// ============================================================================
// SECTION: Imports
// ============================================================================

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use hmac::Hmac;
use hmac::Mac;
use regcheck_core::AzureContainerRequest;
use regcheck_core::ProbeError;
use reqwest::Client;
use reqwest::StatusCode;
use sha2::Sha256;
use time::OffsetDateTime;
use time::macros::format_description;
use url::Url;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Storage service REST version.
const API_VERSION: &str = "2021-08-06";

// ============================================================================
// SECTION: Signing
// ============================================================================

/// Formats a timestamp as an RFC 1123 date.
fn rfc1123(now: OffsetDateTime) -> Result<String, ProbeError> {
    let format = format_description!(
        "[weekday repr:short], [day] [month repr:short] [year] [hour]:[minute]:[second] GMT"
    );
    now.format(format).map_err(|err| ProbeError::Transport(format!("date formatting: {err}")))
}

/// Builds the SharedKey string-to-sign for Get Container Properties.
#[must_use]
pub fn string_to_sign(account: &str, container: &str, date: &str) -> String {
    // VERB plus eleven empty standard headers, one per line.
    let mut text = String::from("GET\n");
    text.push_str(&"\n".repeat(11));
    text.push_str(&format!("x-ms-date:{date}\nx-ms-version:{API_VERSION}\n"));
    text.push_str(&format!("/{account}/{container}\nrestype:container"));
    text
}

/// Signs a string with a base64 account key.
///
/// # Errors
///
/// Returns [`ProbeError::Rejected`] when the key is not valid base64.
pub fn sign(account_key: &str, text: &str) -> Result<String, ProbeError> {
    let key = STANDARD
        .decode(account_key.trim())
        .map_err(|_| ProbeError::Rejected("azure_account_key is not valid base64".to_string()))?;
    let mut mac = Hmac::<Sha256>::new_from_slice(&key)
        .map_err(|_| ProbeError::Rejected("azure_account_key cannot be used as an HMAC key".to_string()))?;
    mac.update(text.as_bytes());
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

// ============================================================================
// SECTION: Probe
// ============================================================================

/// Fetches container properties.
pub(crate) async fn container_properties(
    client: &Client,
    request: &AzureContainerRequest,
) -> Result<(), ProbeError> {
    let mut url = Url::parse(&format!("{}/{}", request.endpoint.trim_end_matches('/'), request.container))
        .map_err(|err| ProbeError::Transport(format!("invalid azure endpoint: {err}")))?;
    let date = rfc1123(OffsetDateTime::now_utc())?;
    let authorization = match (&request.account_key, &request.sas_token) {
        (Some(key), _) => {
            url.set_query(Some("restype=container"));
            let signature = sign(key, &string_to_sign(&request.account_name, &request.container, &date))?;
            Some(format!("SharedKey {}:{signature}", request.account_name))
        }
        (None, Some(token)) => {
            url.set_query(Some(&format!("{}&restype=container", token.trim().trim_start_matches('?'))));
            None
        }
        (None, None) => {
            url.set_query(Some("restype=container"));
            None
        }
    };
    let mut builder = client.get(url).header("x-ms-date", &date).header("x-ms-version", API_VERSION);
    if let Some(authorization) = authorization {
        builder = builder.header("Authorization", authorization);
    }
    let response = builder.send().await.map_err(|err| ProbeError::Transport(err.to_string()))?;
    match response.status() {
        status if status.is_success() => Ok(()),
        StatusCode::NOT_FOUND => Err(ProbeError::NotFound(format!("container {}", request.container))),
        StatusCode::FORBIDDEN | StatusCode::UNAUTHORIZED => {
            Err(ProbeError::Rejected(format!("status {}", response.status().as_u16())))
        }
        status => Err(ProbeError::Transport(format!("unexpected status {}", status.as_u16()))),
    }
}
