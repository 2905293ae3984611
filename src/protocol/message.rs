use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::agent::AgentOutcome;
use crate::ids::{AgentId, MessageId, TaskId};
use crate::store::{ApplicationForm, LoanId};

/// 消息内容，按 `message_type` 区分
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "message_type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageContent {
    ApplicationSubmitted { application: ApplicationForm },
    DocumentVerificationNeeded { loan_application_id: LoanId },
    AgentResponse(AgentOutcome),
}

impl MessageContent {
    pub fn message_type(&self) -> &'static str {
        match self {
            MessageContent::ApplicationSubmitted { .. } => "APPLICATION_SUBMITTED",
            MessageContent::DocumentVerificationNeeded { .. } => "DOCUMENT_VERIFICATION_NEEDED",
            MessageContent::AgentResponse(_) => "AGENT_RESPONSE",
        }
    }

    pub fn as_response(&self) -> Option<&AgentOutcome> {
        match self {
            MessageContent::AgentResponse(outcome) => Some(outcome),
            _ => None,
        }
    }
}

/// 任务内的一条消息，创建后不可变
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub message_id: MessageId,
    pub task_id: TaskId,
    pub sender_agent_id: AgentId,
    pub recipient_agent_id: AgentId,
    pub content: MessageContent,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn new(
        task_id: TaskId,
        sender_agent_id: AgentId,
        recipient_agent_id: AgentId,
        content: MessageContent,
    ) -> Self {
        Self {
            message_id: MessageId::generate(),
            task_id,
            sender_agent_id,
            recipient_agent_id,
            content,
            timestamp: Utc::now(),
        }
    }
}

/// 投递给接收方的完整信封
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MessageEnvelope {
    pub task_id: TaskId,
    pub sender_id: AgentId,
    pub sender_name: String,
    pub recipient_id: AgentId,
    pub timestamp: DateTime<Utc>,
    pub content: MessageContent,
}
