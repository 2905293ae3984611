pub mod agent;
pub mod config;
pub mod error;
pub mod ids;
pub mod llm;
pub mod protocol;
pub mod runtime;
pub mod store;
pub mod utils;
pub mod workflow;

pub use agent::{
    Agent, AgentCard, AgentId, AgentIdentity, AgentKind, AgentOutcome, AgentRegistry,
    ApplicationIntakeAgent, DocumentVerification, DocumentVerificationAgent,
    DocumentVerificationResult, ValidationAssessment,
};
pub use config::{EnvConfig, LoanFlowConfig};
pub use error::{LoanFlowError, Result};
pub use llm::{
    DynLlmClient, GenerationFailure, LlmClient, LlmRequest, LlmResponse, ScriptedLlmClient,
    StructuredOutput,
};
#[cfg(feature = "openai-client")]
pub use llm::OpenAiClient;
pub use protocol::{
    Message, MessageContent, MessageEnvelope, MessageExchange, MessageId, Task, TaskId,
    TaskPayload, TaskRegistry, TaskStatus, TaskType,
};
pub use runtime::{LoanPipeline, LoanStatus, ProcessingReport, SubmissionReport, VerificationStep};
pub use store::{
    ApplicationForm, InteractionType, LoanApplication, LoanId, LoanStore, MemoryLoanStore,
    VerificationStatus,
};
pub use utils::{logging, validation};
pub use workflow::{LoanStateMachine, TransitionOutcome, TransitionRejection, WorkflowState};
