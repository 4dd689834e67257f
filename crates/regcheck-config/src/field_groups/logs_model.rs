// crates/regcheck-config/src/field_groups/logs_model.rs
// ============================================================================
// Module: Logs Model
// Description: Action log storage backend and its producer settings.
// Purpose: Validate the logs model and the producer sub-object.
// Dependencies: regcheck-core, serde
// ============================================================================

//! ## Overview
//! Action logs live in the database by default. The Elasticsearch-backed
//! models need `LOGS_MODEL_CONFIG` with a `producer` naming where writes go
//! and the matching `<producer>_config` object. This group is structural only.

// ============================================================================
// SECTION: Imports
// ============================================================================

use regcheck_core::ConfigError;
use regcheck_core::Finding;
use regcheck_core::RawConfig;
use regcheck_core::document::flexible_int;
use regcheck_core::rules;
use serde::Deserialize;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Field group name.
pub const NAME: &str = "LogsModel";
/// Model key.
pub const MODEL_KEY: &str = "LOGS_MODEL";
/// Model config key.
pub const CONFIG_KEY: &str = "LOGS_MODEL_CONFIG";
/// Keys owned by this group.
pub const FIELDS: &[&str] = &[MODEL_KEY, CONFIG_KEY];
/// Accepted logs models.
pub const MODELS: &[&str] = &["database", "transition_reads_both_writes_es", "elasticsearch", "splunk"];
/// Accepted producers for Elasticsearch models.
pub const PRODUCERS: &[&str] = &["elasticsearch", "kafka", "kinesis_stream"];

// ============================================================================
// SECTION: Types
// ============================================================================

/// Elasticsearch producer settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ElasticsearchProducer {
    /// Cluster host.
    pub host: Option<String>,
    /// Cluster port.
    #[serde(deserialize_with = "flexible_int")]
    pub port: Option<i64>,
    /// Index name prefix.
    pub index_prefix: Option<String>,
    /// Signing region for AWS-hosted clusters.
    pub aws_region: Option<String>,
    /// Use TLS.
    pub use_ssl: Option<bool>,
}

/// Kafka producer settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct KafkaProducer {
    /// Bootstrap servers (`host:port`).
    pub bootstrap_servers: Vec<String>,
    /// Topic receiving log entries.
    pub topic: Option<String>,
    /// Producer send timeout.
    #[serde(deserialize_with = "flexible_int")]
    pub max_block_seconds: Option<i64>,
}

/// Kinesis producer settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct KinesisProducer {
    /// Stream name.
    pub stream_name: Option<String>,
    /// Stream region.
    pub aws_region: Option<String>,
}

/// `LOGS_MODEL_CONFIG` object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LogsModelConfig {
    /// Write destination.
    pub producer: Option<String>,
    /// Elasticsearch settings.
    pub elasticsearch_config: Option<ElasticsearchProducer>,
    /// Kafka settings.
    pub kafka_config: Option<KafkaProducer>,
    /// Kinesis settings.
    pub kinesis_stream_config: Option<KinesisProducer>,
}

/// Logs model settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogsModel {
    /// Storage model.
    pub model: String,
    /// Model config.
    pub config: LogsModelConfig,
}

impl LogsModel {
    /// Decodes the group.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Construction`] for mistyped values.
    pub fn from_raw(raw: &RawConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            model: raw.decode_or(MODEL_KEY, "database".to_string())?,
            config: raw.decode_or_default(CONFIG_KEY)?,
        })
    }

    /// Returns true when the model writes through a producer.
    fn uses_producer(&self) -> bool {
        matches!(self.model.as_str(), "elasticsearch" | "transition_reads_both_writes_es")
    }

    /// Structural rules.
    #[must_use]
    pub fn check(&self) -> Vec<Finding> {
        if let Some(finding) = rules::one_of(NAME, MODEL_KEY, &self.model, MODELS) {
            return vec![finding];
        }
        if !self.uses_producer() {
            return Vec::new();
        }
        let producer_path = format!("{CONFIG_KEY}.producer");
        let Some(producer) = self.config.producer.as_deref().filter(|producer| !producer.trim().is_empty()) else {
            return vec![Finding::error(
                NAME,
                &producer_path,
                format!("{producer_path} is required when {MODEL_KEY} is {}", self.model),
            )];
        };
        if let Some(finding) = rules::one_of(NAME, &producer_path, producer, PRODUCERS) {
            return vec![finding];
        }
        match producer {
            "elasticsearch" => self.check_elasticsearch(),
            "kafka" => self.check_kafka(),
            _ => self.check_kinesis(),
        }
    }

    /// Elasticsearch producer rules.
    fn check_elasticsearch(&self) -> Vec<Finding> {
        let path = format!("{CONFIG_KEY}.elasticsearch_config");
        let Some(config) = &self.config.elasticsearch_config else {
            return vec![Finding::error(NAME, &path, format!("{path} is required for the elasticsearch producer"))];
        };
        let mut findings = Vec::new();
        findings.extend(rules::require_string(NAME, &format!("{path}.host"), config.host.as_deref()));
        if let Some(port) = config.port {
            findings.extend(rules::port(NAME, &format!("{path}.port"), port));
        }
        findings
    }

    /// Kafka producer rules.
    fn check_kafka(&self) -> Vec<Finding> {
        let path = format!("{CONFIG_KEY}.kafka_config");
        let Some(config) = &self.config.kafka_config else {
            return vec![Finding::error(NAME, &path, format!("{path} is required for the kafka producer"))];
        };
        let mut findings = Vec::new();
        findings.extend(rules::require_non_empty(NAME, &format!("{path}.bootstrap_servers"), &config.bootstrap_servers));
        findings.extend(rules::require_string(NAME, &format!("{path}.topic"), config.topic.as_deref()));
        if let Some(seconds) = config.max_block_seconds {
            findings.extend(rules::positive(NAME, &format!("{path}.max_block_seconds"), seconds));
        }
        findings
    }

    /// Kinesis producer rules.
    fn check_kinesis(&self) -> Vec<Finding> {
        let path = format!("{CONFIG_KEY}.kinesis_stream_config");
        let Some(config) = &self.config.kinesis_stream_config else {
            return vec![Finding::error(NAME, &path, format!("{path} is required for the kinesis_stream producer"))];
        };
        rules::collect([
            rules::require_string(NAME, &format!("{path}.stream_name"), config.stream_name.as_deref()),
            rules::require_string(NAME, &format!("{path}.aws_region"), config.aws_region.as_deref()),
        ])
    }
}
