use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashSet;

use crate::error::SchemaViolation;

pub const MAX_COMMONALITIES: usize = 4;
pub const MAX_TENSION_FIELDS: usize = 4;
pub const MIN_CLUSTERS: usize = 1;
pub const MAX_CLUSTERS: usize = 4;

/// Distance from the centre a pole-aligned cluster must keep.
pub const COHERENCE_TOLERANCE: f64 = 0.05;

/// Half-width of the band around 0.5 accepted for mixed clusters.
const NEUTRAL_BAND: f64 = 0.2;

/// Mixed-stance words, matched at the start of a word so that inflections
/// ("gemischte") count but compounds ("Klimaneutralität") do not.
static NEUTRAL_MARKERS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:gemischt|neutral|ambivalent|mittig|ausgewogen|unentschieden|mixed|balanced|undecided)",
    )
    .expect("neutral marker pattern is valid")
});

/// Cross-profile synthesis as produced by the generative step.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SynthesisDraft {
    #[serde(default)]
    pub commonalities: Vec<Commonality>,
    #[serde(default)]
    pub tension_fields: Vec<TensionField>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Commonality {
    pub text: String,
    #[serde(default)]
    pub profile_ids: Vec<String>,
}

/// A bipolar dimension along which the population is partitioned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TensionField {
    pub left_label: String,
    pub right_label: String,
    pub clusters: Vec<Cluster>,
}

/// Position 0 is the left pole, 1 the right pole.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cluster {
    pub position: f64,
    pub profile_ids: Vec<String>,
    pub summary: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoleAlignment {
    Left,
    Right,
    Neutral,
    Unknown,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CoherenceIssue {
    pub field: usize,
    pub cluster: usize,
    pub alignment: PoleAlignment,
    pub position: f64,
}

impl CoherenceIssue {
    pub fn into_violation(self) -> SchemaViolation {
        SchemaViolation::Incoherent {
            field: self.field,
            cluster: self.cluster,
            detail: format!(
                "summary reads as {:?} but position is {:.2}",
                self.alignment, self.position
            ),
        }
    }
}

impl SynthesisDraft {
    /// Enforce the structural contracts against the synthesized population:
    /// bounded list sizes, positions inside [0, 1], and for every tension field
    /// an exact partition of `profile_ids` (no omission, no duplication).
    pub fn validate(&self, profile_ids: &[String]) -> Result<(), SchemaViolation> {
        let population: HashSet<&str> = profile_ids.iter().map(String::as_str).collect();

        if self.commonalities.len() > MAX_COMMONALITIES {
            return Err(SchemaViolation::Cardinality {
                field: "commonalities",
                actual: self.commonalities.len(),
                min: 0,
                max: MAX_COMMONALITIES,
            });
        }
        for (idx, commonality) in self.commonalities.iter().enumerate() {
            if commonality.text.trim().is_empty() {
                return Err(SchemaViolation::EmptyField { field: "commonalities.text" });
            }
            for id in &commonality.profile_ids {
                if !population.contains(id.as_str()) {
                    return Err(SchemaViolation::UnknownProfile {
                        location: format!("commonality {}", idx),
                        profile_id: id.clone(),
                    });
                }
            }
        }

        if self.tension_fields.len() > MAX_TENSION_FIELDS {
            return Err(SchemaViolation::Cardinality {
                field: "tensionFields",
                actual: self.tension_fields.len(),
                min: 0,
                max: MAX_TENSION_FIELDS,
            });
        }
        for (idx, field) in self.tension_fields.iter().enumerate() {
            field.validate_partition(idx, &population)?;
        }

        Ok(())
    }

    /// Label/position coherence across all tension fields.
    pub fn coherence_issues(&self) -> Vec<CoherenceIssue> {
        self.tension_fields
            .iter()
            .enumerate()
            .flat_map(|(idx, field)| field.coherence_issues(idx))
            .collect()
    }

    /// Commonalities without an attribution are attributed to the whole
    /// population.
    pub fn attribute_commonalities(&mut self, profile_ids: &[String]) {
        for commonality in &mut self.commonalities {
            if commonality.profile_ids.is_empty() {
                commonality.profile_ids = profile_ids.to_vec();
            }
        }
    }

    pub fn json_schema() -> Value {
        json!({
            "type": "object",
            "additionalProperties": false,
            "required": ["commonalities", "tensionFields"],
            "properties": {
                "commonalities": {
                    "type": "array",
                    "maxItems": MAX_COMMONALITIES,
                    "description": "Maximum 4 shared themes across perspectives",
                    "items": {
                        "type": "object",
                        "additionalProperties": false,
                        "required": ["text", "profileIds"],
                        "properties": {
                            "text": {
                                "type": "string",
                                "description": "A shared value, goal, or concern that appears across multiple perspectives"
                            },
                            "profileIds": {
                                "type": "array",
                                "items": { "type": "string" },
                                "description": "IDs of the profiles sharing this theme"
                            }
                        }
                    }
                },
                "tensionFields": {
                    "type": "array",
                    "maxItems": MAX_TENSION_FIELDS,
                    "description": "Maximum 4 polarizing dimensions",
                    "items": {
                        "type": "object",
                        "additionalProperties": false,
                        "required": ["leftLabel", "rightLabel", "clusters"],
                        "properties": {
                            "leftLabel": { "type": "string", "description": "One end of the spectrum" },
                            "rightLabel": { "type": "string", "description": "Other end of the spectrum" },
                            "clusters": {
                                "type": "array",
                                "minItems": MIN_CLUSTERS,
                                "maxItems": MAX_CLUSTERS,
                                "items": {
                                    "type": "object",
                                    "additionalProperties": false,
                                    "required": ["position", "profileIds", "summary"],
                                    "properties": {
                                        "position": {
                                            "type": "number",
                                            "minimum": 0,
                                            "maximum": 1,
                                            "description": "0=left, 0.5=center, 1=right"
                                        },
                                        "profileIds": {
                                            "type": "array",
                                            "items": { "type": "string" }
                                        },
                                        "summary": {
                                            "type": "string",
                                            "description": "What the perspectives in this cluster have in common"
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        })
    }
}

impl TensionField {
    fn validate_partition(
        &self,
        field: usize,
        population: &HashSet<&str>,
    ) -> Result<(), SchemaViolation> {
        if self.left_label.trim().is_empty() || self.right_label.trim().is_empty() {
            return Err(SchemaViolation::EmptyField { field: "tensionFields.label" });
        }
        if !(MIN_CLUSTERS..=MAX_CLUSTERS).contains(&self.clusters.len()) {
            return Err(SchemaViolation::Cardinality {
                field: "tensionFields.clusters",
                actual: self.clusters.len(),
                min: MIN_CLUSTERS,
                max: MAX_CLUSTERS,
            });
        }

        let mut seen: HashSet<&str> = HashSet::with_capacity(population.len());
        for (cluster_idx, cluster) in self.clusters.iter().enumerate() {
            if !cluster.position.is_finite() || !(0.0..=1.0).contains(&cluster.position) {
                return Err(SchemaViolation::PositionOutOfRange {
                    field,
                    position: cluster.position,
                });
            }
            if cluster.profile_ids.is_empty() {
                return Err(SchemaViolation::EmptyCluster { field, cluster: cluster_idx });
            }
            for id in &cluster.profile_ids {
                if !population.contains(id.as_str()) {
                    return Err(SchemaViolation::UnknownProfile {
                        location: format!("tension field {} cluster {}", field, cluster_idx),
                        profile_id: id.clone(),
                    });
                }
                if !seen.insert(id.as_str()) {
                    return Err(SchemaViolation::DuplicateProfile {
                        field,
                        profile_id: id.clone(),
                    });
                }
            }
        }

        let mut missing: Vec<&str> = population.difference(&seen).copied().collect();
        missing.sort_unstable();
        if let Some(id) = missing.first() {
            return Err(SchemaViolation::MissingProfile {
                field,
                profile_id: id.to_string(),
            });
        }

        Ok(())
    }

    pub fn coherence_issues(&self, field: usize) -> Vec<CoherenceIssue> {
        self.clusters
            .iter()
            .enumerate()
            .filter_map(|(idx, cluster)| {
                let alignment = cluster.alignment(&self.left_label, &self.right_label);
                if cluster.is_coherent(alignment) {
                    None
                } else {
                    Some(CoherenceIssue {
                        field,
                        cluster: idx,
                        alignment,
                        position: cluster.position,
                    })
                }
            })
            .collect()
    }
}

impl Cluster {
    /// Which pole the summary text leans toward. A label counts as mentioned
    /// when its stem (first six characters, lowercased) occurs in the summary,
    /// so inflected forms like "freiwillige" match "Freiwilligkeit".
    pub fn alignment(&self, left_label: &str, right_label: &str) -> PoleAlignment {
        let summary = self.summary.to_lowercase();

        if NEUTRAL_MARKERS.is_match(&summary) {
            return PoleAlignment::Neutral;
        }

        let mentions_left = summary.contains(&stem(left_label));
        let mentions_right = summary.contains(&stem(right_label));

        match (mentions_left, mentions_right) {
            (true, false) => PoleAlignment::Left,
            (false, true) => PoleAlignment::Right,
            _ => PoleAlignment::Unknown,
        }
    }

    fn is_coherent(&self, alignment: PoleAlignment) -> bool {
        match alignment {
            PoleAlignment::Left => self.position < 0.5 - COHERENCE_TOLERANCE,
            PoleAlignment::Right => self.position > 0.5 + COHERENCE_TOLERANCE,
            PoleAlignment::Neutral => (self.position - 0.5).abs() <= NEUTRAL_BAND,
            PoleAlignment::Unknown => true,
        }
    }
}

fn stem(label: &str) -> String {
    label.trim().to_lowercase().chars().take(6).collect()
}
