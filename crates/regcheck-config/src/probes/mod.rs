// crates/regcheck-config/src/probes/mod.rs
// ============================================================================
// Module: Live Probes
// Description: Network-backed implementations of every probe trait.
// Purpose: Assemble the production probe set for connectivity runs.
// Dependencies: regcheck-core, regcheck-storage
// ============================================================================

//! ## Overview
//! Each probe performs exactly one bounded dependency check. Deadlines come
//! from [`ProbeTimeouts`]; the engine additionally bounds every call with the
//! request deadline and the run's cancellation signal.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod cache;
pub mod database;
pub mod directory;
pub mod http;
pub mod mail;
pub mod transport;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use regcheck_core::ProbeTimeouts;
use regcheck_core::Probes;
use regcheck_storage::AwsCredentialBroker;
use regcheck_storage::LiveObjectStore;

pub use self::cache::LiveCache;
pub use self::database::LiveDatabase;
pub use self::directory::LiveDirectory;
pub use self::http::LiveHttp;
pub use self::http::LiveIdentityProvider;
pub use self::mail::LiveMail;

// ============================================================================
// SECTION: Assembly
// ============================================================================

/// Production probe set.
#[must_use]
pub fn live_probes(timeouts: ProbeTimeouts) -> Probes {
    Probes {
        object_store: Arc::new(LiveObjectStore::new(timeouts)),
        credentials: Arc::new(AwsCredentialBroker::new()),
        database: Arc::new(LiveDatabase),
        cache: Arc::new(LiveCache),
        directory: Arc::new(LiveDirectory::new(timeouts)),
        mail: Arc::new(LiveMail::new(timeouts)),
        identity: Arc::new(LiveIdentityProvider::new(timeouts)),
        http: Arc::new(LiveHttp::new(timeouts)),
    }
}
