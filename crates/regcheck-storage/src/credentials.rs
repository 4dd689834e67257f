// crates/regcheck-storage/src/credentials.rs
// ============================================================================
// Module: Credential Chain
// Description: Ordered credential strategies for S3-dialect storage drivers.
// Purpose: Resolve which identity a probe will use before touching the network.
// Dependencies: regcheck-core, crate::entry
// ============================================================================

//! ## Overview
//! Each driver owns an ordered list of [`CredentialStrategy`] values. A
//! strategy inspects the entry parameters and the ambient environment and
//! yields either a [`CredentialPlan`] or a reason it does not apply. The
//! first plan wins; if every strategy declines, the collected reasons are
//! reported as a single finding and no probe is attempted.
//!
//! Planning is pure apart from reading the token file. Turning a plan into
//! usable keys ([`realize`]) is the only step that talks to a broker.
//!
//! | Driver | Chain |
//! |---|---|
//! | S3, CloudFront | `explicit_keys`, `instance_role` |
//! | IRSA | `ambient_web_identity` |
//! | STS | `assume_role_with_web_identity`, `assume_role_with_user_keys` |
//! | S3-compatible gateways, GCS | `explicit_keys` |

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use regcheck_core::AmbientEnvironment;
use regcheck_core::AssumeRoleRequest;
use regcheck_core::CredentialBroker;
use regcheck_core::ProbeError;
use regcheck_core::RoleIdentity;
use regcheck_core::StaticCredentials;
use regcheck_core::environment::ENV_ROLE_ARN;
use regcheck_core::environment::ENV_ROLE_SESSION_NAME;
use regcheck_core::environment::ENV_WEB_IDENTITY_TOKEN_FILE;

use crate::entry::StorageDriver;
use crate::entry::StorageParams;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Session name used when neither configuration nor environment names one.
pub const DEFAULT_SESSION_NAME: &str = "registry-config-validation";
/// Lifetime requested for assumed-role credentials.
pub const ASSUME_ROLE_DURATION_SECS: i32 = 3_600;

// ============================================================================
// SECTION: Types
// ============================================================================

/// How a probe will obtain credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialPlan {
    /// Use configured keys as-is.
    Static(StaticCredentials),
    /// Fetch the instance role from the metadata service.
    InstanceRole,
    /// Exchange an identity for short-lived role credentials.
    AssumeRole(AssumeRoleRequest),
}

/// Result of one strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StrategyOutcome {
    /// The strategy produced a plan.
    Resolved(CredentialPlan),
    /// The strategy does not apply; the reason is reported on exhaustion.
    NotApplicable(String),
}

/// Inputs visible to a strategy.
#[derive(Debug, Clone, Copy)]
pub struct CredentialContext<'a> {
    /// Entry parameters.
    pub params: &'a StorageParams,
    /// Ambient environment reader.
    pub environment: &'a AmbientEnvironment,
    /// Signing region for STS calls.
    pub region: &'a str,
}

/// Named credential strategy.
#[derive(Clone, Copy)]
pub struct CredentialStrategy {
    /// Stable strategy name.
    pub name: &'static str,
    /// Strategy function.
    pub resolve: fn(&CredentialContext<'_>) -> StrategyOutcome,
}

impl fmt::Debug for CredentialStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialStrategy").field("name", &self.name).finish_non_exhaustive()
    }
}

/// A plan together with the strategy that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPlan {
    /// Strategy name.
    pub strategy: &'static str,
    /// Credential plan.
    pub plan: CredentialPlan,
}

/// Every strategy in a chain declined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainExhausted {
    /// Strategy name and reason, in chain order.
    pub reasons: Vec<(&'static str, String)>,
}

impl fmt::Display for ChainExhausted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined: Vec<String> =
            self.reasons.iter().map(|(name, reason)| format!("{name}: {reason}")).collect();
        f.write_str(&joined.join("; "))
    }
}

// ============================================================================
// SECTION: Strategies
// ============================================================================

/// Configured static keys (`s3_access_key`/`s3_secret_key` or `access_key`/`secret_key`).
pub const EXPLICIT_KEYS: CredentialStrategy = CredentialStrategy {
    name: "explicit_keys",
    resolve: explicit_keys,
};

/// Instance metadata role; always applicable, may fail when realized.
pub const INSTANCE_ROLE: CredentialStrategy = CredentialStrategy {
    name: "instance_role",
    resolve: instance_role,
};

/// IRSA role and token file from the environment only.
pub const AMBIENT_WEB_IDENTITY: CredentialStrategy = CredentialStrategy {
    name: "ambient_web_identity",
    resolve: ambient_web_identity,
};

/// AssumeRole with a configured or environment web identity token file.
pub const ASSUME_ROLE_WITH_WEB_IDENTITY: CredentialStrategy = CredentialStrategy {
    name: "assume_role_with_web_identity",
    resolve: assume_role_with_web_identity,
};

/// AssumeRole with configured STS user keys.
pub const ASSUME_ROLE_WITH_USER_KEYS: CredentialStrategy = CredentialStrategy {
    name: "assume_role_with_user_keys",
    resolve: assume_role_with_user_keys,
};

/// Returns a trimmed, non-empty string.
fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

/// Resolves configured static keys.
fn explicit_keys(ctx: &CredentialContext<'_>) -> StrategyOutcome {
    let params = ctx.params;
    let pairs = [
        (present(params.s3_access_key.as_deref()), present(params.s3_secret_key.as_deref())),
        (present(params.access_key.as_deref()), present(params.secret_key.as_deref())),
    ];
    for (access, secret) in pairs {
        if let (Some(access), Some(secret)) = (access, secret) {
            return StrategyOutcome::Resolved(CredentialPlan::Static(StaticCredentials::new(access, secret)));
        }
    }
    StrategyOutcome::NotApplicable("no access key and secret key pair is configured".to_string())
}

/// Falls back to the instance role.
const fn instance_role(_ctx: &CredentialContext<'_>) -> StrategyOutcome {
    StrategyOutcome::Resolved(CredentialPlan::InstanceRole)
}

/// Session name from configuration, then environment, then the default.
fn session_name(ctx: &CredentialContext<'_>, configured: Option<&str>) -> String {
    present(configured)
        .map(str::to_string)
        .or_else(|| ctx.environment.var(ENV_ROLE_SESSION_NAME))
        .unwrap_or_else(|| DEFAULT_SESSION_NAME.to_string())
}

/// Builds an AssumeRole plan.
fn assume(ctx: &CredentialContext<'_>, role_arn: String, session: String, identity: RoleIdentity) -> StrategyOutcome {
    StrategyOutcome::Resolved(CredentialPlan::AssumeRole(AssumeRoleRequest {
        role_arn,
        session_name: session,
        region: ctx.region.to_string(),
        duration_secs: ASSUME_ROLE_DURATION_SECS,
        identity,
    }))
}

/// Resolves IRSA inputs from the environment.
fn ambient_web_identity(ctx: &CredentialContext<'_>) -> StrategyOutcome {
    let role = ctx.environment.var(ENV_ROLE_ARN);
    let token_file = ctx.environment.var(ENV_WEB_IDENTITY_TOKEN_FILE);
    let (Some(role), Some(token_file)) = (role, token_file) else {
        return StrategyOutcome::NotApplicable(format!(
            "{ENV_ROLE_ARN} and {ENV_WEB_IDENTITY_TOKEN_FILE} must both be set"
        ));
    };
    if let Err(err) = ctx.environment.read_token_file(&token_file) {
        return StrategyOutcome::NotApplicable(format!(
            "token file named by {ENV_WEB_IDENTITY_TOKEN_FILE} is unreadable ({err}); {ENV_ROLE_ARN} and {ENV_WEB_IDENTITY_TOKEN_FILE} are both required"
        ));
    }
    let session = session_name(ctx, None);
    assume(ctx, role, session, RoleIdentity::WebIdentityTokenFile(token_file))
}

/// Role ARN from configuration, then environment.
fn role_arn(ctx: &CredentialContext<'_>) -> Option<String> {
    present(ctx.params.sts_role_arn.as_deref())
        .map(str::to_string)
        .or_else(|| ctx.environment.var(ENV_ROLE_ARN))
}

/// Resolves AssumeRole with a web identity token file.
fn assume_role_with_web_identity(ctx: &CredentialContext<'_>) -> StrategyOutcome {
    let token_file = present(ctx.params.sts_web_identity_token_file.as_deref())
        .map(str::to_string)
        .or_else(|| ctx.environment.var(ENV_WEB_IDENTITY_TOKEN_FILE));
    let Some(token_file) = token_file else {
        return StrategyOutcome::NotApplicable(format!(
            "no web identity token file in sts_web_identity_token_file or {ENV_WEB_IDENTITY_TOKEN_FILE}"
        ));
    };
    if let Err(err) = ctx.environment.read_token_file(&token_file) {
        return StrategyOutcome::NotApplicable(format!("web identity token file is unreadable ({err})"));
    }
    let Some(role) = role_arn(ctx) else {
        return StrategyOutcome::NotApplicable(format!("no role in sts_role_arn or {ENV_ROLE_ARN}"));
    };
    let session = session_name(ctx, ctx.params.sts_role_session_name.as_deref());
    assume(ctx, role, session, RoleIdentity::WebIdentityTokenFile(token_file))
}

/// Resolves AssumeRole with STS user keys.
fn assume_role_with_user_keys(ctx: &CredentialContext<'_>) -> StrategyOutcome {
    let access = present(ctx.params.sts_user_access_key.as_deref());
    let secret = present(ctx.params.sts_user_secret_key.as_deref());
    let (Some(access), Some(secret)) = (access, secret) else {
        return StrategyOutcome::NotApplicable(
            "sts_user_access_key and sts_user_secret_key are not both configured".to_string(),
        );
    };
    let Some(role) = role_arn(ctx) else {
        return StrategyOutcome::NotApplicable(format!("no role in sts_role_arn or {ENV_ROLE_ARN}"));
    };
    let session = session_name(ctx, ctx.params.sts_role_session_name.as_deref());
    assume(ctx, role, session, RoleIdentity::UserKeys(StaticCredentials::new(access, secret)))
}

// ============================================================================
// SECTION: Chains
// ============================================================================

/// Chain for AWS S3 and CloudFront-fronted S3.
const AWS_S3_CHAIN: &[CredentialStrategy] = &[EXPLICIT_KEYS, INSTANCE_ROLE];
/// Chain for IRSA.
const IRSA_CHAIN: &[CredentialStrategy] = &[AMBIENT_WEB_IDENTITY];
/// Chain for STS AssumeRole.
const STS_CHAIN: &[CredentialStrategy] = &[ASSUME_ROLE_WITH_WEB_IDENTITY, ASSUME_ROLE_WITH_USER_KEYS];
/// Chain for gateways that only accept configured keys.
const STATIC_CHAIN: &[CredentialStrategy] = &[EXPLICIT_KEYS];

/// Strategy chain for a driver; empty for drivers that never sign S3 requests.
#[must_use]
pub const fn chain_for(driver: StorageDriver) -> &'static [CredentialStrategy] {
    match driver {
        StorageDriver::S3 | StorageDriver::CloudFrontS3 => AWS_S3_CHAIN,
        StorageDriver::IrsaS3 => IRSA_CHAIN,
        StorageDriver::StsS3 => STS_CHAIN,
        StorageDriver::RadosGw
        | StorageDriver::Rhocs
        | StorageDriver::IbmCloud
        | StorageDriver::GoogleCloud => STATIC_CHAIN,
        StorageDriver::Local
        | StorageDriver::Azure
        | StorageDriver::Swift
        | StorageDriver::CloudFlareS3
        | StorageDriver::MultiCdn => &[],
    }
}

/// Walks a chain and returns the first plan.
///
/// # Errors
///
/// Returns [`ChainExhausted`] with every strategy's reason when none applies.
pub fn resolve(
    chain: &[CredentialStrategy],
    ctx: &CredentialContext<'_>,
) -> Result<ResolvedPlan, ChainExhausted> {
    let mut reasons = Vec::with_capacity(chain.len());
    for strategy in chain {
        match (strategy.resolve)(ctx) {
            StrategyOutcome::Resolved(plan) => {
                return Ok(ResolvedPlan {
                    strategy: strategy.name,
                    plan,
                });
            }
            StrategyOutcome::NotApplicable(reason) => reasons.push((strategy.name, reason)),
        }
    }
    Err(ChainExhausted {
        reasons,
    })
}

/// Turns a plan into usable credentials.
///
/// # Errors
///
/// Returns the broker's [`ProbeError`] when the instance role or AssumeRole call fails.
pub async fn realize(
    plan: CredentialPlan,
    broker: &dyn CredentialBroker,
    region: &str,
) -> Result<StaticCredentials, ProbeError> {
    match plan {
        CredentialPlan::Static(credentials) => Ok(credentials),
        CredentialPlan::InstanceRole => broker.instance_role(region).await,
        CredentialPlan::AssumeRole(request) => broker.assume_role(&request).await,
    }
}
