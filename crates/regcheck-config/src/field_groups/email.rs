// crates/regcheck-config/src/field_groups/email.rs
// ============================================================================
// Module: Email
// Description: Outbound mail relay settings.
// Purpose: Validate mail settings and probe the relay handshake.
// Dependencies: regcheck-core
// ============================================================================

//! Mail relay settings, checked only when `FEATURE_MAILING` is on.

// ============================================================================
// SECTION: Imports
// ============================================================================

use regcheck_core::ConfigError;
use regcheck_core::Finding;
use regcheck_core::MailRequest;
use regcheck_core::RawConfig;
use regcheck_core::ValidationOptions;
use regcheck_core::rules;
use regcheck_core::runtime::bounded;

use crate::field_groups::int;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Field group name.
pub const NAME: &str = "Email";
/// Keys owned by this group.
pub const FIELDS: &[&str] = &[
    "FEATURE_MAILING",
    "MAIL_SERVER",
    "MAIL_PORT",
    "MAIL_USE_TLS",
    "MAIL_USE_AUTH",
    "MAIL_USERNAME",
    "MAIL_PASSWORD",
    "MAIL_DEFAULT_SENDER",
];
/// Default submission port.
pub const DEFAULT_PORT: i64 = 587;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Mail settings.
#[derive(Clone, PartialEq, Eq)]
pub struct Email {
    /// Mailing enabled.
    pub mailing: bool,
    /// Relay host.
    pub server: Option<String>,
    /// Relay port.
    pub port: i64,
    /// Upgrade with STARTTLS.
    pub use_tls: bool,
    /// Authenticate to the relay.
    pub use_auth: bool,
    /// Relay user.
    pub username: Option<String>,
    /// Relay password.
    pub password: Option<String>,
    /// Sender address.
    pub default_sender: Option<String>,
}

impl std::fmt::Debug for Email {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Email")
            .field("mailing", &self.mailing)
            .field("server", &self.server)
            .field("port", &self.port)
            .field("use_tls", &self.use_tls)
            .field("use_auth", &self.use_auth)
            .finish_non_exhaustive()
    }
}

impl Email {
    /// Decodes the group.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Construction`] for mistyped values.
    pub fn from_raw(raw: &RawConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            mailing: raw.decode_or("FEATURE_MAILING", false)?,
            server: raw.decode("MAIL_SERVER")?,
            port: int(raw, "MAIL_PORT")?.unwrap_or(DEFAULT_PORT),
            use_tls: raw.decode_or("MAIL_USE_TLS", true)?,
            use_auth: raw.decode_or("MAIL_USE_AUTH", false)?,
            username: raw.decode("MAIL_USERNAME")?,
            password: raw.decode("MAIL_PASSWORD")?,
            default_sender: raw.decode("MAIL_DEFAULT_SENDER")?,
        })
    }

    /// Structural rules; inactive unless mailing is enabled.
    #[must_use]
    pub fn check(&self) -> Vec<Finding> {
        if !self.mailing {
            return Vec::new();
        }
        let mut findings = Vec::new();
        findings.extend(rules::require_string(NAME, "MAIL_SERVER", self.server.as_deref()));
        findings.extend(rules::port(NAME, "MAIL_PORT", self.port));
        if self.use_auth {
            findings.extend(rules::require_string(NAME, "MAIL_USERNAME", self.username.as_deref()));
            findings.extend(rules::require_string(NAME, "MAIL_PASSWORD", self.password.as_deref()));
        }
        if let Some(sender) = self.default_sender.as_deref().filter(|sender| !sender.trim().is_empty()) {
            findings.extend(rules::email(NAME, "MAIL_DEFAULT_SENDER", sender));
        }
        findings
    }

    /// Greets the relay and runs STARTTLS and AUTH as configured.
    pub async fn probe(&self, options: &ValidationOptions) -> Vec<Finding> {
        if !self.mailing {
            return Vec::new();
        }
        let Ok(port) = u16::try_from(self.port) else {
            return Vec::new();
        };
        let request = MailRequest {
            host: self.server.clone().unwrap_or_default().trim().to_string(),
            port,
            starttls: self.use_tls,
            credentials: self
                .use_auth
                .then(|| (self.username.clone().unwrap_or_default(), self.password.clone().unwrap_or_default())),
        };
        match bounded(options, "mail relay", options.probes.mail.handshake(&request)).await {
            Ok(()) => Vec::new(),
            Err(err) => vec![Finding::error(
                NAME,
                "MAIL_SERVER",
                format!("could not connect to mail server {}:{}: {err}", request.host, request.port),
            )],
        }
    }
}
