// crates/regcheck-storage/src/lib.rs
// ============================================================================
// Module: Regcheck Storage Library
// Description: Distributed storage entries, credential chains and probes.
// Purpose: Validate every DISTRIBUTED_STORAGE_CONFIG entry by driver.
// Dependencies: regcheck-core, aws-sdk-s3, aws-config, reqwest
// ============================================================================

//! ## Overview
//! A storage entry is a `(driver tag, parameters)` pair. [`resolver::check`]
//! applies the driver's document rules; [`resolver::probe`] additionally
//! resolves a credential plan ([`credentials`]) and asks the configured
//! [`regcheck_core::ObjectStoreProbe`] to confirm the bucket or container.
//! [`live`] holds the network implementations.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod credentials;
pub mod endpoint;
pub mod entry;
pub mod live;
pub mod resolver;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use credentials::ChainExhausted;
pub use credentials::CredentialPlan;
pub use credentials::ResolvedPlan;
pub use entry::STORAGE_CONFIG_KEY;
pub use entry::StorageDriver;
pub use entry::StorageDriverTag;
pub use entry::StorageEntry;
pub use entry::StorageParams;
pub use entry::parse_storage_config;
pub use live::AwsCredentialBroker;
pub use live::LiveObjectStore;
pub use resolver::FIELD_GROUP;
