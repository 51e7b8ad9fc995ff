/*!
 * Configuration
 * Runtime settings for the decision point, read from the environment
 */

use crate::core::limits::{DEFAULT_MAX_STAGED, DEFAULT_MAX_UPLOAD_BYTES, DEFAULT_SLOW_DECISION};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Decision point configuration
///
/// Environment variables:
/// - PDP_POLICY_PATH: policy document loaded at startup
/// - PDP_CONTENT_PATHS: comma-separated content documents loaded at startup
/// - PDP_MAX_STAGED: staging queue capacity
/// - PDP_MAX_UPLOAD_BYTES: size limit of a single staged document
/// - PDP_SLOW_DECISION_MS: decisions slower than this log a warning
/// - PDP_TRACE_JSON: JSON log output (`1` or `true`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PdpConfig {
    pub policy_path: Option<PathBuf>,
    pub content_paths: Vec<PathBuf>,
    pub max_staged: usize,
    pub max_upload_bytes: usize,
    #[serde(with = "millis")]
    pub slow_decision: Duration,
    pub trace_json: bool,
}

impl Default for PdpConfig {
    fn default() -> Self {
        Self {
            policy_path: None,
            content_paths: Vec::new(),
            max_staged: DEFAULT_MAX_STAGED,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            slow_decision: DEFAULT_SLOW_DECISION,
            trace_json: false,
        }
    }
}

impl PdpConfig {
    /// Read the configuration from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the configuration through `lookup`
    ///
    /// Unset or unparsable values keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(path) = lookup("PDP_POLICY_PATH").filter(|p| !p.is_empty()) {
            config.policy_path = Some(PathBuf::from(path));
        }
        if let Some(paths) = lookup("PDP_CONTENT_PATHS") {
            config.content_paths = paths
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(PathBuf::from)
                .collect();
        }
        if let Some(max) = lookup("PDP_MAX_STAGED").and_then(|v| v.parse().ok()) {
            config.max_staged = max;
        }
        if let Some(max) = lookup("PDP_MAX_UPLOAD_BYTES").and_then(|v| v.parse().ok()) {
            config.max_upload_bytes = max;
        }
        if let Some(ms) = lookup("PDP_SLOW_DECISION_MS").and_then(|v| v.parse().ok()) {
            config.slow_decision = Duration::from_millis(ms);
        }
        if let Some(flag) = lookup("PDP_TRACE_JSON") {
            config.trace_json = flag == "1" || flag == "true";
        }

        config
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
