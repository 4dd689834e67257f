// crates/regcheck-config/src/probes/cache.rs
// ============================================================================
// Module: Cache Probe
// Description: Redis PING over TCP or TLS.
// Purpose: Prove each cache connection accepts the configured login.
// Dependencies: redis, url
// ============================================================================

//! Redis `PING` through the `redis` async client.

// ============================================================================
// SECTION: Imports
// ============================================================================

use async_trait::async_trait;
use redis::ErrorKind;
use redis::RedisError;
use regcheck_core::CacheProbe;
use regcheck_core::CacheRequest;
use regcheck_core::ProbeError;
use url::Url;

// ============================================================================
// SECTION: Probe
// ============================================================================

/// Redis probe.
#[derive(Debug, Clone, Copy, Default)]
pub struct LiveCache;

#[async_trait]
impl CacheProbe for LiveCache {
    async fn ping(&self, request: &CacheRequest) -> Result<(), ProbeError> {
        let client = redis::Client::open(connection_url(request)?.as_str()).map_err(map_error)?;
        let mut connection = client.get_multiplexed_async_connection().await.map_err(map_error)?;
        let reply: String = redis::cmd("PING").query_async(&mut connection).await.map_err(map_error)?;
        if reply.eq_ignore_ascii_case("PONG") {
            Ok(())
        } else {
            Err(ProbeError::Transport(format!("unexpected PING reply {reply}")))
        }
    }
}

/// Builds the `redis://` or `rediss://` URL with percent-encoded credentials.
///
/// # Errors
///
/// Returns [`ProbeError::Transport`] when the host cannot form a URL.
pub fn connection_url(request: &CacheRequest) -> Result<Url, ProbeError> {
    let scheme = if request.tls { "rediss" } else { "redis" };
    let mut url = Url::parse(&format!("{scheme}://{}:{}/", request.host, request.port))
        .map_err(|err| ProbeError::Transport(format!("invalid redis host: {err}")))?;
    if let Some(username) = &request.username {
        url.set_username(username)
            .map_err(|()| ProbeError::Transport("redis username cannot be encoded".to_string()))?;
    }
    if let Some(password) = &request.password {
        url.set_password(Some(password))
            .map_err(|()| ProbeError::Transport("redis password cannot be encoded".to_string()))?;
    }
    Ok(url)
}

/// Maps client errors, separating authentication failures.
fn map_error(err: RedisError) -> ProbeError {
    match err.kind() {
        ErrorKind::AuthenticationFailed => ProbeError::Rejected("redis rejected the credentials".to_string()),
        _ => ProbeError::Transport(err.to_string()),
    }
}
