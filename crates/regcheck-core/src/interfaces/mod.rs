// crates/regcheck-core/src/interfaces/mod.rs
// ============================================================================
// Module: Probe Interfaces
// Description: Backend-agnostic traits for every live dependency probe.
// Purpose: Let validators request live checks without binding to a client.
// Dependencies: async-trait, thiserror
// ============================================================================

//! ## Overview
//! Validators never open sockets themselves. They build a request value and
//! hand it to one of the probe traits collected in [`Probes`]. Live
//! implementations live in the backend crates; [`Probes::offline`] answers
//! every call with [`ProbeError::Unavailable`] and is used for structural runs
//! and tests.
//!
//! Request types carry secrets; none of them derive `Debug` with those
//! secrets visible.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Live probe errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
/// - Messages never include credential material.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeError {
    /// Probe exceeded its deadline.
    #[error("timed out after {0} ms")]
    Timeout(u128),
    /// Probe was aborted by cancellation.
    #[error("cancelled")]
    Cancelled,
    /// Connection or protocol failure.
    #[error("transport error: {0}")]
    Transport(String),
    /// Remote side rejected the credentials or request.
    #[error("rejected: {0}")]
    Rejected(String),
    /// Target resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),
    /// No live implementation is available.
    #[error("probe unavailable: {0}")]
    Unavailable(String),
}

// ============================================================================
// SECTION: Shared Types
// ============================================================================

/// Static or short-lived S3-dialect credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct StaticCredentials {
    /// Access key id.
    pub access_key_id: String,
    /// Secret access key.
    pub secret_access_key: String,
    /// Session token for temporary credentials.
    pub session_token: Option<String>,
}

impl StaticCredentials {
    /// Creates long-lived credentials without a session token.
    #[must_use]
    pub fn new(access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            session_token: None,
        }
    }
}

impl fmt::Debug for StaticCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

// ============================================================================
// SECTION: Object Storage
// ============================================================================

/// S3-dialect bucket existence request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketRequest {
    /// Endpoint URL including scheme; `None` uses the provider default.
    pub endpoint: Option<String>,
    /// Signing region.
    pub region: String,
    /// Bucket name.
    pub bucket: String,
    /// Credentials used for exactly this request.
    pub credentials: StaticCredentials,
    /// Whether to address the bucket in the path rather than the host.
    pub force_path_style: bool,
}

/// Azure Blob container properties request.
#[derive(Clone, PartialEq, Eq)]
pub struct AzureContainerRequest {
    /// Blob service endpoint URL.
    pub endpoint: String,
    /// Storage account name.
    pub account_name: String,
    /// Shared key (base64) when signing with the account key.
    pub account_key: Option<String>,
    /// SAS token appended to the query when present.
    pub sas_token: Option<String>,
    /// Container name.
    pub container: String,
}

impl fmt::Debug for AzureContainerRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AzureContainerRequest")
            .field("endpoint", &self.endpoint)
            .field("account_name", &self.account_name)
            .field("container", &self.container)
            .finish_non_exhaustive()
    }
}

/// OpenStack Swift auth protocol version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwiftAuthVersion {
    /// Legacy `X-Auth-User`/`X-Auth-Key` exchange.
    V1,
    /// Keystone v2 tokens.
    V2,
    /// Keystone v3 tokens with domain and project scope.
    V3,
}

impl SwiftAuthVersion {
    /// Parses the configured version number.
    #[must_use]
    pub const fn from_number(value: i64) -> Option<Self> {
        match value {
            1 => Some(Self::V1),
            2 => Some(Self::V2),
            3 => Some(Self::V3),
            _ => None,
        }
    }
}

/// OpenStack Swift container listing request.
#[derive(Clone, PartialEq, Eq)]
pub struct SwiftContainerRequest {
    /// Identity endpoint URL.
    pub auth_url: String,
    /// Auth protocol version.
    pub auth_version: SwiftAuthVersion,
    /// User name.
    pub user: String,
    /// Password or key.
    pub password: String,
    /// Container expected in the listing.
    pub container: String,
    /// Project id (v2 tenant, v3 project scope).
    pub tenant_id: Option<String>,
    /// User domain name (v3 only).
    pub user_domain_name: Option<String>,
    /// CA certificate (PEM) for the identity and storage endpoints.
    pub ca_pem: Option<Vec<u8>>,
}

impl fmt::Debug for SwiftContainerRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SwiftContainerRequest")
            .field("auth_url", &self.auth_url)
            .field("auth_version", &self.auth_version)
            .field("user", &self.user)
            .field("container", &self.container)
            .field("tenant_id", &self.tenant_id)
            .field("user_domain_name", &self.user_domain_name)
            .finish_non_exhaustive()
    }
}

/// Live object storage probe.
#[async_trait]
pub trait ObjectStoreProbe: Send + Sync {
    /// Confirms an S3-dialect bucket exists and the credentials can see it.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError`] when the bucket cannot be confirmed.
    async fn bucket_exists(&self, request: &BucketRequest) -> Result<(), ProbeError>;

    /// Fetches Azure container properties.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError`] when the container cannot be confirmed.
    async fn azure_container(&self, request: &AzureContainerRequest) -> Result<(), ProbeError>;

    /// Authenticates against Swift and confirms the container is listed.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError`] when authentication or the listing fails.
    async fn swift_container(&self, request: &SwiftContainerRequest) -> Result<(), ProbeError>;
}

// ============================================================================
// SECTION: Credential Broker
// ============================================================================

/// Identity presented to the security token service.
#[derive(Clone, PartialEq, Eq)]
pub enum RoleIdentity {
    /// Path of a readable federated web identity token file.
    WebIdentityTokenFile(String),
    /// Long-lived user keys.
    UserKeys(StaticCredentials),
}

impl fmt::Debug for RoleIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WebIdentityTokenFile(path) => f.debug_tuple("WebIdentityTokenFile").field(path).finish(),
            Self::UserKeys(keys) => f.debug_tuple("UserKeys").field(keys).finish(),
        }
    }
}

/// AssumeRole request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssumeRoleRequest {
    /// Role ARN.
    pub role_arn: String,
    /// Session name.
    pub session_name: String,
    /// STS region.
    pub region: String,
    /// Requested credential lifetime in seconds.
    pub duration_secs: i32,
    /// Identity used for the exchange.
    pub identity: RoleIdentity,
}

/// Short-lived credential broker.
#[async_trait]
pub trait CredentialBroker: Send + Sync {
    /// Reads credentials from the instance metadata service.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError`] when no instance role is available.
    async fn instance_role(&self, region: &str) -> Result<StaticCredentials, ProbeError>;

    /// Exchanges an identity for short-lived role credentials.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError`] when the exchange fails.
    async fn assume_role(&self, request: &AssumeRoleRequest) -> Result<StaticCredentials, ProbeError>;
}

// ============================================================================
// SECTION: Database
// ============================================================================

/// Database engine family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseEngine {
    /// PostgreSQL.
    Postgres,
    /// MySQL or MariaDB.
    Mysql,
    /// SQLite file.
    Sqlite,
}

/// Database connectivity request.
#[derive(Clone, PartialEq, Eq)]
pub struct DatabaseRequest {
    /// Engine family.
    pub engine: DatabaseEngine,
    /// Connection URL in the client's native scheme.
    pub url: String,
    /// TLS mode requested by the configuration.
    pub ssl_mode: Option<String>,
    /// CA certificate (PEM).
    pub ca_pem: Option<Vec<u8>>,
}

impl fmt::Debug for DatabaseRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseRequest")
            .field("engine", &self.engine)
            .field("ssl_mode", &self.ssl_mode)
            .finish_non_exhaustive()
    }
}

/// Facts returned by a successful database probe.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatabaseFacts {
    /// Server version string.
    pub server_version: String,
    /// Installed extensions (PostgreSQL only).
    pub extensions: Vec<String>,
}

/// Live database probe.
#[async_trait]
pub trait DatabaseProbe: Send + Sync {
    /// Connects and reads the server version.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError`] when the database is unreachable or rejects the login.
    async fn connect(&self, request: &DatabaseRequest) -> Result<DatabaseFacts, ProbeError>;
}

// ============================================================================
// SECTION: Cache
// ============================================================================

/// Cache connection request.
#[derive(Clone, PartialEq, Eq)]
pub struct CacheRequest {
    /// Host name.
    pub host: String,
    /// TCP port.
    pub port: u16,
    /// ACL user name.
    pub username: Option<String>,
    /// Password.
    pub password: Option<String>,
    /// Whether to use TLS.
    pub tls: bool,
}

impl fmt::Debug for CacheRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheRequest")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("tls", &self.tls)
            .finish_non_exhaustive()
    }
}

/// Live cache probe.
#[async_trait]
pub trait CacheProbe: Send + Sync {
    /// Connects and issues a PING.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError`] when the server is unreachable or rejects the login.
    async fn ping(&self, request: &CacheRequest) -> Result<(), ProbeError>;
}

// ============================================================================
// SECTION: Directory Service
// ============================================================================

/// Directory bind and search request.
#[derive(Clone, PartialEq, Eq)]
pub struct DirectoryRequest {
    /// `ldap://` or `ldaps://` URI.
    pub uri: String,
    /// Bind DN.
    pub bind_dn: String,
    /// Bind password.
    pub password: String,
    /// Search base.
    pub base_dn: String,
    /// Search filter.
    pub filter: String,
    /// CA certificate (PEM) for `ldaps://`.
    pub ca_pem: Option<Vec<u8>>,
}

impl fmt::Debug for DirectoryRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirectoryRequest")
            .field("uri", &self.uri)
            .field("bind_dn", &self.bind_dn)
            .field("base_dn", &self.base_dn)
            .field("filter", &self.filter)
            .finish_non_exhaustive()
    }
}

/// Live directory service probe.
#[async_trait]
pub trait DirectoryProbe: Send + Sync {
    /// Binds and runs one search, returning the number of entries found.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError`] when the bind or search fails.
    async fn bind_and_search(&self, request: &DirectoryRequest) -> Result<usize, ProbeError>;
}

// ============================================================================
// SECTION: Mail Relay
// ============================================================================

/// Mail relay handshake request.
#[derive(Clone, PartialEq, Eq)]
pub struct MailRequest {
    /// Relay host.
    pub host: String,
    /// Relay port.
    pub port: u16,
    /// Whether to upgrade with STARTTLS.
    pub starttls: bool,
    /// Credentials for AUTH PLAIN.
    pub credentials: Option<(String, String)>,
}

impl fmt::Debug for MailRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MailRequest")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("starttls", &self.starttls)
            .field("auth", &self.credentials.is_some())
            .finish()
    }
}

/// Live mail relay probe.
#[async_trait]
pub trait MailProbe: Send + Sync {
    /// Performs the greeting, EHLO, optional STARTTLS and optional AUTH.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError`] when any step fails.
    async fn handshake(&self, request: &MailRequest) -> Result<(), ProbeError>;
}

// ============================================================================
// SECTION: Identity Provider
// ============================================================================

/// Token exchange request using a deliberately invalid authorization code.
#[derive(Clone, PartialEq, Eq)]
pub struct TokenExchangeRequest {
    /// Issuer base URL (ends with `/`).
    pub server: String,
    /// Client id.
    pub client_id: String,
    /// Client secret.
    pub client_secret: String,
    /// Authorization code to exchange.
    pub code: String,
}

impl fmt::Debug for TokenExchangeRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenExchangeRequest")
            .field("server", &self.server)
            .field("client_id", &self.client_id)
            .finish_non_exhaustive()
    }
}

/// Token endpoint answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenExchangeResponse {
    /// HTTP status.
    pub status: u16,
    /// OAuth `error` field when present.
    pub error: Option<String>,
}

/// Live identity provider probe.
#[async_trait]
pub trait IdentityProviderProbe: Send + Sync {
    /// Loads discovery, then posts the code to the token endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError`] when discovery or the token endpoint is unreachable.
    async fn exchange_code(
        &self,
        request: &TokenExchangeRequest,
    ) -> Result<TokenExchangeResponse, ProbeError>;
}

// ============================================================================
// SECTION: HTTP Services
// ============================================================================

/// Plain HTTP GET request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    /// Absolute URL.
    pub url: String,
    /// Extra CA certificate (PEM).
    pub ca_pem: Option<Vec<u8>>,
}

/// Live HTTP probe.
#[async_trait]
pub trait HttpProbe: Send + Sync {
    /// Issues a GET and returns the status code.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError`] when the request cannot complete.
    async fn get(&self, request: &HttpRequest) -> Result<u16, ProbeError>;
}

// ============================================================================
// SECTION: Probe Set
// ============================================================================

/// Every probe a validation run may use.
#[derive(Clone)]
pub struct Probes {
    /// Object storage probe.
    pub object_store: Arc<dyn ObjectStoreProbe>,
    /// Credential broker.
    pub credentials: Arc<dyn CredentialBroker>,
    /// Database probe.
    pub database: Arc<dyn DatabaseProbe>,
    /// Cache probe.
    pub cache: Arc<dyn CacheProbe>,
    /// Directory service probe.
    pub directory: Arc<dyn DirectoryProbe>,
    /// Mail relay probe.
    pub mail: Arc<dyn MailProbe>,
    /// Identity provider probe.
    pub identity: Arc<dyn IdentityProviderProbe>,
    /// HTTP probe.
    pub http: Arc<dyn HttpProbe>,
}

impl Probes {
    /// Probe set that answers every call with [`ProbeError::Unavailable`].
    #[must_use]
    pub fn offline() -> Self {
        let offline = Arc::new(OfflineProbe);
        Self {
            object_store: offline.clone(),
            credentials: offline.clone(),
            database: offline.clone(),
            cache: offline.clone(),
            directory: offline.clone(),
            mail: offline.clone(),
            identity: offline.clone(),
            http: offline,
        }
    }
}

/// Probe implementation with no network access.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineProbe;

impl OfflineProbe {
    /// Error returned by every call.
    fn unavailable() -> ProbeError {
        ProbeError::Unavailable("no live probe configured".to_string())
    }
}

#[async_trait]
impl ObjectStoreProbe for OfflineProbe {
    async fn bucket_exists(&self, _request: &BucketRequest) -> Result<(), ProbeError> {
        Err(Self::unavailable())
    }

    async fn azure_container(&self, _request: &AzureContainerRequest) -> Result<(), ProbeError> {
        Err(Self::unavailable())
    }

    async fn swift_container(&self, _request: &SwiftContainerRequest) -> Result<(), ProbeError> {
        Err(Self::unavailable())
    }
}

#[async_trait]
impl CredentialBroker for OfflineProbe {
    async fn instance_role(&self, _region: &str) -> Result<StaticCredentials, ProbeError> {
        Err(Self::unavailable())
    }

    async fn assume_role(&self, _request: &AssumeRoleRequest) -> Result<StaticCredentials, ProbeError> {
        Err(Self::unavailable())
    }
}

#[async_trait]
impl DatabaseProbe for OfflineProbe {
    async fn connect(&self, _request: &DatabaseRequest) -> Result<DatabaseFacts, ProbeError> {
        Err(Self::unavailable())
    }
}

#[async_trait]
impl CacheProbe for OfflineProbe {
    async fn ping(&self, _request: &CacheRequest) -> Result<(), ProbeError> {
        Err(Self::unavailable())
    }
}

#[async_trait]
impl DirectoryProbe for OfflineProbe {
    async fn bind_and_search(&self, _request: &DirectoryRequest) -> Result<usize, ProbeError> {
        Err(Self::unavailable())
    }
}

#[async_trait]
impl MailProbe for OfflineProbe {
    async fn handshake(&self, _request: &MailRequest) -> Result<(), ProbeError> {
        Err(Self::unavailable())
    }
}

#[async_trait]
impl IdentityProviderProbe for OfflineProbe {
    async fn exchange_code(
        &self,
        _request: &TokenExchangeRequest,
    ) -> Result<TokenExchangeResponse, ProbeError> {
        Err(Self::unavailable())
    }
}

#[async_trait]
impl HttpProbe for OfflineProbe {
    async fn get(&self, _request: &HttpRequest) -> Result<u16, ProbeError> {
        Err(Self::unavailable())
    }
}
