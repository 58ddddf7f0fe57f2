use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::SchemaViolation;

pub const MIN_CORE_VALUES: usize = 3;
pub const MAX_CORE_VALUES: usize = 5;

/// Structured attitude profile distilled from one participant's conversation.
///
/// Field names on the wire follow the extraction schema (`camelCase`), so the
/// generated object deserializes directly into this type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttitudeProfile {
    pub profile_title: String,
    #[serde(default)]
    pub subtitle: Option<String>,
    pub role_context: String,
    pub overall_attitude: String,
    pub core_values: Vec<CoreValue>,
    #[serde(default)]
    pub key_concerns: Vec<KeyConcern>,
    #[serde(default)]
    pub red_lines: Vec<RedLine>,
    #[serde(default)]
    pub counterarguments: Vec<Counterargument>,
    #[serde(default)]
    pub conditions_for_change: Vec<ConditionForChange>,
    pub characterization: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoreValue {
    pub label: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyConcern {
    pub text: String,
    #[serde(default)]
    pub qualification: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedLine {
    pub text: String,
    #[serde(default)]
    pub scope: Option<RedLineScope>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RedLineScope {
    Personal,
    Ethical,
    Political,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Counterargument {
    pub argument: String,
    pub why_understood: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionForChange {
    pub condition_text: String,
    #[serde(default, rename = "type")]
    pub condition_type: Option<ConditionType>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConditionType {
    Safeguard,
    OptOut,
    Pilot,
    Transparency,
    Separation,
}

impl AttitudeProfile {
    /// Check the cardinality and non-emptiness contracts the JSON schema
    /// cannot fully enforce on its own.
    pub fn validate(&self) -> Result<(), SchemaViolation> {
        non_empty("profileTitle", &self.profile_title)?;
        non_empty("roleContext", &self.role_context)?;
        non_empty("overallAttitude", &self.overall_attitude)?;
        non_empty("characterization", &self.characterization)?;

        let count = self.core_values.len();
        if !(MIN_CORE_VALUES..=MAX_CORE_VALUES).contains(&count) {
            return Err(SchemaViolation::Cardinality {
                field: "coreValues",
                actual: count,
                min: MIN_CORE_VALUES,
                max: MAX_CORE_VALUES,
            });
        }
        for value in &self.core_values {
            non_empty("coreValues.label", &value.label)?;
        }
        for concern in &self.key_concerns {
            non_empty("keyConcerns.text", &concern.text)?;
        }
        for line in &self.red_lines {
            non_empty("redLines.text", &line.text)?;
        }
        for counter in &self.counterarguments {
            non_empty("counterarguments.argument", &counter.argument)?;
        }
        for condition in &self.conditions_for_change {
            non_empty("conditionsForChange.conditionText", &condition.condition_text)?;
        }

        Ok(())
    }

    /// JSON schema handed to the structured-extraction call (strict mode:
    /// every property required, optional values expressed as nullable).
    pub fn json_schema() -> Value {
        json!({
            "type": "object",
            "additionalProperties": false,
            "required": [
                "profileTitle", "subtitle", "roleContext", "overallAttitude",
                "coreValues", "keyConcerns", "redLines", "counterarguments",
                "conditionsForChange", "characterization"
            ],
            "properties": {
                "profileTitle": {
                    "type": "string",
                    "description": "Short 2-4 word title capturing the core attitude"
                },
                "subtitle": {
                    "type": ["string", "null"],
                    "description": "Optional short clarifying phrase, max ~8 words"
                },
                "roleContext": {
                    "type": "string",
                    "description": "Role and position from which the person speaks"
                },
                "overallAttitude": {
                    "type": "string",
                    "description": "General stance toward the topic including orientation and emotional tone"
                },
                "coreValues": {
                    "type": "array",
                    "minItems": MIN_CORE_VALUES,
                    "maxItems": MAX_CORE_VALUES,
                    "description": "3-5 key values and needs driving the attitude",
                    "items": {
                        "type": "object",
                        "additionalProperties": false,
                        "required": ["label", "description"],
                        "properties": {
                            "label": { "type": "string", "description": "Short name like Autonomy, Safety, Fairness" },
                            "description": { "type": ["string", "null"], "description": "Short clarification in plain language" }
                        }
                    }
                },
                "keyConcerns": {
                    "type": "array",
                    "description": "Soft constraints: worries and risks that are potentially negotiable",
                    "items": {
                        "type": "object",
                        "additionalProperties": false,
                        "required": ["text", "qualification"],
                        "properties": {
                            "text": { "type": "string" },
                            "qualification": { "type": ["string", "null"], "description": "Why this matters" }
                        }
                    }
                },
                "redLines": {
                    "type": "array",
                    "description": "Hard constraints: crossing these makes the option unacceptable",
                    "items": {
                        "type": "object",
                        "additionalProperties": false,
                        "required": ["text", "scope"],
                        "properties": {
                            "text": { "type": "string" },
                            "scope": {
                                "type": ["string", "null"],
                                "enum": ["personal", "ethical", "political", null]
                            }
                        }
                    }
                },
                "counterarguments": {
                    "type": "array",
                    "description": "Arguments the person does not agree with but understands",
                    "items": {
                        "type": "object",
                        "additionalProperties": false,
                        "required": ["argument", "whyUnderstood"],
                        "properties": {
                            "argument": { "type": "string" },
                            "whyUnderstood": { "type": "string" }
                        }
                    }
                },
                "conditionsForChange": {
                    "type": "array",
                    "description": "Conditions under which the person might reconsider",
                    "items": {
                        "type": "object",
                        "additionalProperties": false,
                        "required": ["conditionText", "type"],
                        "properties": {
                            "conditionText": { "type": "string" },
                            "type": {
                                "type": ["string", "null"],
                                "enum": ["safeguard", "opt-out", "pilot", "transparency", "separation", null]
                            }
                        }
                    }
                },
                "characterization": {
                    "type": "string",
                    "description": "1-2 sentence neutral summary of the attitude"
                }
            }
        })
    }
}

fn non_empty(field: &'static str, value: &str) -> Result<(), SchemaViolation> {
    if value.trim().is_empty() {
        return Err(SchemaViolation::EmptyField { field });
    }
    Ok(())
}
