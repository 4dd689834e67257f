// crates/regcheck-config/src/probes/http.rs
// ============================================================================
// Module: HTTP Probes
// Description: Plain GET and OpenID Connect token exchange.
// Purpose: Reach HTTP services and identity providers with bounded clients.
// Dependencies: regcheck-storage, reqwest, serde
// ============================================================================

//! ## Overview
//! The identity probe loads `.well-known/openid-configuration` below the
//! issuer, then posts an authorization-code grant to its token endpoint with
//! the client credentials in the form body. The caller interprets the OAuth
//! `error` field of the answer.

// ============================================================================
// SECTION: Imports
// ============================================================================

use async_trait::async_trait;
use regcheck_core::HttpProbe;
use regcheck_core::HttpRequest;
use regcheck_core::IdentityProviderProbe;
use regcheck_core::ProbeError;
use regcheck_core::ProbeTimeouts;
use regcheck_core::TokenExchangeRequest;
use regcheck_core::TokenExchangeResponse;
use regcheck_storage::live::http_client;
use serde::Deserialize;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Discovery document path below the issuer.
pub const DISCOVERY_PATH: &str = ".well-known/openid-configuration";
/// Redirect URI sent with the throwaway code.
const PROBE_REDIRECT_URI: &str = "http://localhost/oauth2/callback";

// ============================================================================
// SECTION: Wire Types
// ============================================================================

/// Fields of the discovery document the probe needs.
#[derive(Debug, Deserialize)]
struct Discovery {
    /// Token endpoint URL.
    token_endpoint: String,
}

/// OAuth error body.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TokenError {
    /// OAuth error code.
    error: Option<String>,
}

// ============================================================================
// SECTION: Probes
// ============================================================================

/// HTTP GET probe.
#[derive(Debug, Clone, Copy, Default)]
pub struct LiveHttp {
    /// Connect and request deadlines.
    timeouts: ProbeTimeouts,
}

impl LiveHttp {
    /// Creates a probe with the given deadlines.
    #[must_use]
    pub const fn new(timeouts: ProbeTimeouts) -> Self {
        Self {
            timeouts,
        }
    }
}

#[async_trait]
impl HttpProbe for LiveHttp {
    async fn get(&self, request: &HttpRequest) -> Result<u16, ProbeError> {
        let client = http_client(self.timeouts, request.ca_pem.as_deref())?;
        let response = client.get(&request.url).send().await.map_err(map_error)?;
        Ok(response.status().as_u16())
    }
}

/// OpenID Connect token exchange probe.
#[derive(Debug, Clone, Copy, Default)]
pub struct LiveIdentityProvider {
    /// Connect and request deadlines.
    timeouts: ProbeTimeouts,
}

impl LiveIdentityProvider {
    /// Creates a probe with the given deadlines.
    #[must_use]
    pub const fn new(timeouts: ProbeTimeouts) -> Self {
        Self {
            timeouts,
        }
    }
}

#[async_trait]
impl IdentityProviderProbe for LiveIdentityProvider {
    async fn exchange_code(&self, request: &TokenExchangeRequest) -> Result<TokenExchangeResponse, ProbeError> {
        let client = http_client(self.timeouts, None)?;
        let discovery_url = discovery_url(&request.server);
        let response = client.get(&discovery_url).send().await.map_err(map_error)?;
        if !response.status().is_success() {
            return Err(ProbeError::NotFound(format!(
                "discovery document {discovery_url} answered {}",
                response.status().as_u16()
            )));
        }
        let discovery: Discovery = response
            .json()
            .await
            .map_err(|err| ProbeError::Transport(format!("invalid discovery document: {err}")))?;
        let form = [
            ("grant_type", "authorization_code"),
            ("code", request.code.as_str()),
            ("redirect_uri", PROBE_REDIRECT_URI),
            ("client_id", request.client_id.as_str()),
            ("client_secret", request.client_secret.as_str()),
        ];
        let response = client.post(&discovery.token_endpoint).form(&form).send().await.map_err(map_error)?;
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        let error = serde_json::from_str::<TokenError>(&body).ok().and_then(|parsed| parsed.error);
        Ok(TokenExchangeResponse {
            status,
            error,
        })
    }
}

/// Discovery URL for an issuer, tolerating a missing trailing `/`.
#[must_use]
pub fn discovery_url(server: &str) -> String {
    format!("{}/{DISCOVERY_PATH}", server.trim().trim_end_matches('/'))
}

/// Maps client errors.
fn map_error(err: reqwest::Error) -> ProbeError {
    if err.is_timeout() {
        ProbeError::Transport("request timed out".to_string())
    } else {
        ProbeError::Transport(err.to_string())
    }
}
