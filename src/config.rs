//! Rules-file loading.
//!
//! The config file is a YAML list of rule entries:
//!
//! ```yaml
//! - name: alarms
//!   url: https://alarms.internal/notify
//!   filePatterns:
//!     - alarms.yml
//! ```
//!
//! `filePatterns` entries are exact paths. Patterns containing `*` are
//! dropped at load time, not glob-expanded: wildcard support has been
//! deliberately withheld, and a pattern that needs one simply never
//! matches anything.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::routing::RouteRule;

/// Environment variable naming the rules file.
const CONFIG_PATH_VAR: &str = "CHANGE_RELAY_CONFIG";
/// Fallback rules-file location.
const DEFAULT_CONFIG_PATH: &str = "/etc/change-relay.yaml";

/// Errors from config loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed config file {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// One raw YAML rule entry.
#[derive(Debug, Deserialize)]
struct RawRuleEntry {
    name: String,
    url: String,
    #[serde(rename = "filePatterns", default)]
    file_patterns: Vec<String>,
}

impl RawRuleEntry {
    fn into_rule(self) -> RouteRule {
        let (kept, dropped): (Vec<String>, Vec<String>) = self
            .file_patterns
            .into_iter()
            .partition(|pattern| !pattern.contains('*'));
        if !dropped.is_empty() {
            warn!(
                rule = %self.name,
                dropped = ?dropped,
                "ignoring wildcard patterns, matching is exact"
            );
        }
        RouteRule::new(self.name, self.url, kept)
    }
}

/// The rules-file path: `$CHANGE_RELAY_CONFIG` or the `/etc` default.
pub fn rules_path() -> PathBuf {
    std::env::var(CONFIG_PATH_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Loads routing rules from `path`.
///
/// A missing file is an empty rule list, not an error: the service still
/// answers webhooks, it just never matches.
pub fn load_rules(path: &Path) -> Result<Vec<RouteRule>, ConfigError> {
    if !path.exists() {
        warn!(path = %path.display(), "no rules file, starting with zero rules");
        return Ok(Vec::new());
    }

    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let entries: Vec<RawRuleEntry> =
        serde_yaml::from_str(&text).map_err(|source| ConfigError::Yaml {
            path: path.to_path_buf(),
            source,
        })?;

    let rules: Vec<RouteRule> = entries.into_iter().map(RawRuleEntry::into_rule).collect();
    info!(path = %path.display(), rules = rules.len(), "loaded routing rules");
    Ok(rules)
}
