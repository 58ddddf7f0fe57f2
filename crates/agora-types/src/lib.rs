pub mod error;
pub mod events;
pub mod identity;
pub mod profile;
pub mod synthesis;

pub use error::SchemaViolation;
pub use events::TurnEvent;
pub use identity::ParticipantIdentity;
pub use profile::{
    AttitudeProfile, ConditionForChange, ConditionType, CoreValue, Counterargument, KeyConcern,
    RedLine, RedLineScope,
};
pub use synthesis::{
    Cluster, CoherenceIssue, Commonality, PoleAlignment, SynthesisDraft, TensionField,
    COHERENCE_TOLERANCE, MAX_COMMONALITIES, MAX_TENSION_FIELDS,
};
