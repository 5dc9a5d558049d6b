//! The outbound payload POSTed to a matching rule's URL.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::{prune_dotgit_suffix, RepoId, Sha};
use crate::webhooks::EventTimestamp;

/// Why the downstream service is being called.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutboundType {
    /// A change landed on the default branch.
    Commit,
    /// A proposed change should be checked (pull request or retest).
    Verify,
}

/// How a file matched its rule. Exact path equality is the only matching
/// the service performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchType {
    ExactMatch,
}

/// A matched file's contents at the head commit. There is deliberately no
/// `old` side: downstream services get the state to converge on, not a
/// diff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileContents {
    pub new: String,
}

/// One matched file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileEntry {
    pub filepath: String,
    #[serde(rename = "matchType")]
    pub match_type: MatchType,
    pub contents: FileContents,
}

/// The commit the payload was built from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GitSource {
    /// The repository URL with any `.git` suffix stripped, never
    /// credential-bearing.
    pub uri: String,
    pub sha: Sha,
}

/// The normalized payload sent downstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundPayload {
    pub app_id: String,
    pub files: Vec<FileEntry>,
    #[serde(rename = "eventTimestamp")]
    pub event_timestamp: String,
    #[serde(rename = "type")]
    pub outbound_type: OutboundType,
    pub source: GitSource,
}

impl OutboundPayload {
    /// Assembles a payload from fetched file contents.
    pub fn build(
        repo: &RepoId,
        repo_url: &str,
        head_sha: &Sha,
        files: BTreeMap<String, String>,
        timestamp: &EventTimestamp,
        outbound_type: OutboundType,
    ) -> Self {
        OutboundPayload {
            app_id: repo.app_id(),
            files: files
                .into_iter()
                .map(|(filepath, new)| FileEntry {
                    filepath,
                    match_type: MatchType::ExactMatch,
                    contents: FileContents { new },
                })
                .collect(),
            event_timestamp: timestamp.to_iso8601(),
            outbound_type,
            source: GitSource {
                uri: prune_dotgit_suffix(repo_url).to_string(),
                sha: head_sha.clone(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_payload() -> OutboundPayload {
        OutboundPayload::build(
            &RepoId::new("ebay", "thing"),
            "https://github.com/ebay/thing.git",
            &Sha::new("a".repeat(40)),
            BTreeMap::from([("alarms.yml".to_string(), "a: 1\n".to_string())]),
            &EventTimestamp::Epoch(1_620_000_000),
            OutboundType::Commit,
        )
    }

    #[test]
    fn wire_shape() {
        let value = serde_json::to_value(build_payload()).unwrap();

        assert_eq!(value["app_id"], "ebay_thing");
        assert_eq!(value["type"], "COMMIT");
        assert_eq!(value["eventTimestamp"], "2021-05-03T00:00:00+00:00");
        assert_eq!(value["source"]["uri"], "https://github.com/ebay/thing");
        assert_eq!(value["source"]["sha"], "a".repeat(40));

        let file = &value["files"][0];
        assert_eq!(file["filepath"], "alarms.yml");
        assert_eq!(file["matchType"], "EXACT_MATCH");
        assert_eq!(file["contents"]["new"], "a: 1\n");
        assert!(
            file["contents"].get("old").is_none(),
            "contents must not carry an old side"
        );
    }

    #[test]
    fn outbound_type_serialization() {
        assert_eq!(
            serde_json::to_string(&OutboundType::Commit).unwrap(),
            "\"COMMIT\""
        );
        assert_eq!(
            serde_json::to_string(&OutboundType::Verify).unwrap(),
            "\"VERIFY\""
        );
    }
}
