// crates/regcheck-storage/src/live/swift.rs
// ============================================================================
// Module: Swift Container Probe
// Description: Keystone/Swift authentication and container listing.
// Purpose: Confirm Swift credentials work and the container is listed.
// Dependencies: reqwest, serde, serde_json
// ============================================================================

//! ## Overview
//! Authentication yields a storage URL and token:
//! - v1: `GET auth_url` with `X-Auth-User`/`X-Auth-Key`.
//! - v2: `POST {auth_url}/tokens` with password credentials and tenant id.
//! - v3: `POST {auth_url}/auth/tokens` with a domain-scoped user and a
//!   project scope; the token arrives in `X-Subject-Token`.
//!
//! The probe then lists containers (filtered by prefix) and looks for an
//! exact name match.

// ============================================================================
// SECTION: Imports
// ============================================================================

use regcheck_core::ProbeError;
use regcheck_core::SwiftAuthVersion;
use regcheck_core::SwiftContainerRequest;
use reqwest::Client;
use reqwest::Response;
use serde::Deserialize;
use serde_json::json;

// ============================================================================
// SECTION: Wire Types
// ============================================================================

/// Keystone v2 token response.
#[derive(Debug, Deserialize)]
struct V2Response {
    /// Access block.
    access: V2Access,
}

/// Keystone v2 access block.
#[derive(Debug, Deserialize)]
struct V2Access {
    /// Issued token.
    token: V2Token,
    /// Service catalog.
    #[serde(rename = "serviceCatalog", default)]
    service_catalog: Vec<V2Service>,
}

/// Keystone v2 token.
#[derive(Debug, Deserialize)]
struct V2Token {
    /// Token id.
    id: String,
}

/// Keystone v2 catalog entry.
#[derive(Debug, Deserialize)]
struct V2Service {
    /// Service type.
    #[serde(rename = "type")]
    kind: String,
    /// Service endpoints.
    #[serde(default)]
    endpoints: Vec<V2Endpoint>,
}

/// Keystone v2 endpoint.
#[derive(Debug, Deserialize)]
struct V2Endpoint {
    /// Public URL.
    #[serde(rename = "publicURL")]
    public_url: Option<String>,
}

/// Keystone v3 token response.
#[derive(Debug, Deserialize)]
struct V3Response {
    /// Token body.
    token: V3Token,
}

/// Keystone v3 token body.
#[derive(Debug, Deserialize)]
struct V3Token {
    /// Service catalog.
    #[serde(default)]
    catalog: Vec<V3Service>,
}

/// Keystone v3 catalog entry.
#[derive(Debug, Deserialize)]
struct V3Service {
    /// Service type.
    #[serde(rename = "type")]
    kind: String,
    /// Service endpoints.
    #[serde(default)]
    endpoints: Vec<V3Endpoint>,
}

/// Keystone v3 endpoint.
#[derive(Debug, Deserialize)]
struct V3Endpoint {
    /// Interface label (`public`, `internal`, `admin`).
    interface: String,
    /// Endpoint URL.
    url: String,
}

/// Container listing item.
#[derive(Debug, Deserialize)]
struct ContainerItem {
    /// Container name.
    name: String,
}

/// Authenticated Swift session.
struct Session {
    /// Object storage URL.
    storage_url: String,
    /// Auth token.
    token: String,
}

// ============================================================================
// SECTION: Authentication
// ============================================================================

/// Maps a non-success auth response to a probe error.
fn auth_status(response: &Response) -> Result<(), ProbeError> {
    let status = response.status();
    if status.is_success() {
        Ok(())
    } else if status.as_u16() == 401 || status.as_u16() == 403 {
        Err(ProbeError::Rejected(format!("authentication returned status {}", status.as_u16())))
    } else {
        Err(ProbeError::Transport(format!("authentication returned status {}", status.as_u16())))
    }
}

/// Appends a path suffix unless the URL already ends with it.
fn auth_endpoint(auth_url: &str, suffix: &str) -> String {
    let base = auth_url.trim_end_matches('/');
    if base.ends_with(suffix) { base.to_string() } else { format!("{base}{suffix}") }
}

/// Reads a response header as a string.
fn header(response: &Response, name: &str) -> Option<String> {
    response.headers().get(name).and_then(|value| value.to_str().ok()).map(str::to_string)
}

/// v1 authentication.
async fn authenticate_v1(client: &Client, request: &SwiftContainerRequest) -> Result<Session, ProbeError> {
    let response = client
        .get(&request.auth_url)
        .header("X-Auth-User", &request.user)
        .header("X-Auth-Key", &request.password)
        .send()
        .await
        .map_err(|err| ProbeError::Transport(err.to_string()))?;
    auth_status(&response)?;
    let storage_url = header(&response, "X-Storage-Url")
        .ok_or_else(|| ProbeError::Transport("auth response has no X-Storage-Url".to_string()))?;
    let token = header(&response, "X-Auth-Token")
        .ok_or_else(|| ProbeError::Transport("auth response has no X-Auth-Token".to_string()))?;
    Ok(Session {
        storage_url,
        token,
    })
}

/// v2 authentication.
async fn authenticate_v2(client: &Client, request: &SwiftContainerRequest) -> Result<Session, ProbeError> {
    let mut auth = json!({
        "passwordCredentials": {"username": request.user, "password": request.password},
    });
    if let Some(tenant) = &request.tenant_id {
        auth["tenantId"] = json!(tenant);
    }
    let response = client
        .post(auth_endpoint(&request.auth_url, "/tokens"))
        .json(&json!({ "auth": auth }))
        .send()
        .await
        .map_err(|err| ProbeError::Transport(err.to_string()))?;
    auth_status(&response)?;
    let body: V2Response =
        response.json().await.map_err(|err| ProbeError::Transport(format!("auth response: {err}")))?;
    let storage_url = body
        .access
        .service_catalog
        .into_iter()
        .filter(|service| service.kind == "object-store")
        .flat_map(|service| service.endpoints)
        .find_map(|endpoint| endpoint.public_url)
        .ok_or_else(|| ProbeError::Transport("service catalog has no object-store endpoint".to_string()))?;
    Ok(Session {
        storage_url,
        token: body.access.token.id,
    })
}

/// v3 authentication.
async fn authenticate_v3(client: &Client, request: &SwiftContainerRequest) -> Result<Session, ProbeError> {
    let domain = request.user_domain_name.clone().unwrap_or_default();
    let project = request.tenant_id.clone().unwrap_or_default();
    let payload = json!({
        "auth": {
            "identity": {
                "methods": ["password"],
                "password": {
                    "user": {
                        "name": request.user,
                        "domain": {"name": domain},
                        "password": request.password,
                    }
                }
            },
            "scope": {"project": {"id": project}}
        }
    });
    let response = client
        .post(auth_endpoint(&request.auth_url, "/auth/tokens"))
        .json(&payload)
        .send()
        .await
        .map_err(|err| ProbeError::Transport(err.to_string()))?;
    auth_status(&response)?;
    let token = header(&response, "X-Subject-Token")
        .ok_or_else(|| ProbeError::Transport("auth response has no X-Subject-Token".to_string()))?;
    let body: V3Response =
        response.json().await.map_err(|err| ProbeError::Transport(format!("auth response: {err}")))?;
    let storage_url = body
        .token
        .catalog
        .into_iter()
        .filter(|service| service.kind == "object-store")
        .flat_map(|service| service.endpoints)
        .find(|endpoint| endpoint.interface == "public")
        .map(|endpoint| endpoint.url)
        .ok_or_else(|| ProbeError::Transport("service catalog has no public object-store endpoint".to_string()))?;
    Ok(Session {
        storage_url,
        token,
    })
}

// ============================================================================
// SECTION: Probe
// ============================================================================

/// Authenticates, then checks the container listing.
pub(crate) async fn container_listed(client: &Client, request: &SwiftContainerRequest) -> Result<(), ProbeError> {
    let session = match request.auth_version {
        SwiftAuthVersion::V1 => authenticate_v1(client, request).await?,
        SwiftAuthVersion::V2 => authenticate_v2(client, request).await?,
        SwiftAuthVersion::V3 => authenticate_v3(client, request).await?,
    };
    let response = client
        .get(&session.storage_url)
        .query(&[("format", "json"), ("prefix", request.container.as_str())])
        .header("X-Auth-Token", &session.token)
        .send()
        .await
        .map_err(|err| ProbeError::Transport(err.to_string()))?;
    let status = response.status();
    if status.as_u16() == 204 {
        return Err(ProbeError::NotFound(format!("container {}", request.container)));
    }
    if !status.is_success() {
        return Err(ProbeError::Transport(format!("container listing returned status {}", status.as_u16())));
    }
    let items: Vec<ContainerItem> =
        response.json().await.map_err(|err| ProbeError::Transport(format!("container listing: {err}")))?;
    if items.iter().any(|item| item.name == request.container) {
        Ok(())
    } else {
        Err(ProbeError::NotFound(format!("container {}", request.container)))
    }
}
