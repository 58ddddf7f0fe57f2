use thiserror::Error;

/// A structured object returned by the generative step broke one of its
/// structural contracts.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaViolation {
    #[error("Field '{field}' must not be empty")]
    EmptyField { field: &'static str },

    #[error("Field '{field}' has {actual} items, expected {min}..={max}")]
    Cardinality {
        field: &'static str,
        actual: usize,
        min: usize,
        max: usize,
    },

    #[error("Cluster position {position} in tension field {field} is outside [0, 1]")]
    PositionOutOfRange { field: usize, position: f64 },

    #[error("Cluster {cluster} in tension field {field} has no profiles")]
    EmptyCluster { field: usize, cluster: usize },

    #[error("Profile {profile_id} appears in more than one cluster of tension field {field}")]
    DuplicateProfile { field: usize, profile_id: String },

    #[error("Profile {profile_id} is missing from tension field {field}")]
    MissingProfile { field: usize, profile_id: String },

    #[error("Unknown profile id {profile_id} referenced in {location}")]
    UnknownProfile { location: String, profile_id: String },

    #[error("Cluster {cluster} in tension field {field} contradicts its position: {detail}")]
    Incoherent {
        field: usize,
        cluster: usize,
        detail: String,
    },
}
