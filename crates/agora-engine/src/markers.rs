//! Inline content references: `[[CONTENT:id1,id2]]`.
//!
//! Replies are persisted verbatim; markers are only interpreted on read.

use agora_persist::{Artifact, TopicCatalog};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::Result;

static MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[\[CONTENT:([^\[\]]*)\]\]").expect("marker pattern is valid"));

static INNER_SPACES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[ \t]{2,}").expect("spacing pattern is valid"));

/// Most artifact ids a single reply may reference
pub const MAX_IDS_PER_REPLY: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedReply {
    pub clean_text: String,
    /// Referenced ids in order of first appearance, without duplicates
    pub content_ids: Vec<String>,
}

/// Split a reply into display text and referenced artifact ids
pub fn parse_reply(text: &str) -> ParsedReply {
    if !MARKER.is_match(text) {
        return ParsedReply {
            clean_text: text.to_string(),
            content_ids: Vec::new(),
        };
    }

    let mut content_ids: Vec<String> = Vec::new();
    for captures in MARKER.captures_iter(text) {
        let Some(list) = captures.get(1) else { continue };
        for id in list.as_str().split(',').map(str::trim) {
            if !id.is_empty() && !content_ids.iter().any(|seen| seen == id) {
                content_ids.push(id.to_string());
            }
        }
    }

    let stripped = MARKER.replace_all(text, "");
    let clean_text = stripped
        .lines()
        .map(|line| INNER_SPACES.replace_all(line, " ").trim_end().to_string())
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string();

    ParsedReply {
        clean_text,
        content_ids,
    }
}

/// Artifacts of a topic named by `ids`, in the order given. Unknown ids and
/// ids of other topics are skipped.
pub async fn resolve_artifacts(
    catalog: &dyn TopicCatalog,
    topic_id: &str,
    ids: &[String],
) -> Result<Vec<Artifact>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let artifacts = catalog.list_artifacts(topic_id).await?;
    let resolved: Vec<Artifact> = ids
        .iter()
        .filter_map(|id| artifacts.iter().find(|a| &a.id == id).cloned())
        .collect();

    if resolved.len() < ids.len() {
        tracing::debug!(
            topic_id,
            requested = ids.len(),
            resolved = resolved.len(),
            "Ignoring unknown content ids"
        );
    }
    Ok(resolved)
}
