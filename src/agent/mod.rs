pub mod agent;
pub mod builtin;
pub mod outcome;
pub mod registry;

pub use agent::{Agent, AgentCard, AgentIdentity, AgentKind};
pub use builtin::{ApplicationIntakeAgent, DocumentVerificationAgent};
pub use outcome::{
    AgentOutcome, CompletenessCheck, ConsistencyCheck, DocumentVerification,
    DocumentVerificationResult, EligibilityCheck, ValidationAssessment,
};
pub use registry::AgentRegistry;

pub use crate::ids::AgentId;
