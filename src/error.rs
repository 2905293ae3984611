use thiserror::Error;

use crate::ids::{AgentId, TaskId};
use crate::store::{DocumentId, LoanId};
use crate::workflow::WorkflowState;

pub type Result<T> = std::result::Result<T, LoanFlowError>;

#[derive(Debug, Error)]
pub enum LoanFlowError {
    #[error("agent `{0}` not registered")]
    AgentNotFound(AgentId),
    #[error("sender agent `{0}` not registered")]
    SenderNotFound(AgentId),
    #[error("recipient agent `{0}` not registered")]
    RecipientNotFound(AgentId),
    #[error("agent `{0}` already registered")]
    DuplicateAgent(AgentId),
    #[error("task `{0}` not found")]
    TaskNotFound(TaskId),
    #[error("loan application `{0}` not found")]
    LoanNotFound(LoanId),
    #[error("document `{0}` not found")]
    DocumentNotFound(DocumentId),
    #[error("loan application `{loan_id}` is in state {actual}, expected {expected}")]
    StateConflict {
        loan_id: LoanId,
        expected: WorkflowState,
        actual: WorkflowState,
    },
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("llm error: {0}")]
    Llm(String),
    #[error("config error: {0}")]
    Config(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<serde_json::Error> for LoanFlowError {
    fn from(err: serde_json::Error) -> Self {
        LoanFlowError::Serialization(err.to_string())
    }
}
