use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::outcome::AgentOutcome;
use crate::error::Result;
use crate::ids::AgentId;
use crate::protocol::{MessageContent, MessageEnvelope};
use crate::store::LoanId;

/// 智能体种类（封闭集合）
///
/// 新增智能体时在这里增加变体，能力列表随种类静态确定。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    ApplicationIntake,
    DocumentVerification,
}

impl AgentKind {
    pub fn capabilities(self) -> &'static [&'static str] {
        match self {
            AgentKind::ApplicationIntake => &[
                "validate_application_form",
                "check_application_completeness",
                "perform_initial_eligibility_check",
            ],
            AgentKind::DocumentVerification => &[
                "verify_identity_documents",
                "verify_income_documents",
                "verify_employment_documents",
                "validate_property_documents",
                "detect_document_discrepancies",
            ],
        }
    }
}

#[derive(Clone, Debug)]
pub struct AgentIdentity {
    pub id: AgentId,
    pub name: String,
    pub description: String,
}

impl AgentIdentity {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: AgentId::generate(),
            name: name.into(),
            description: description.into(),
        }
    }
}

/// 智能体能力卡片
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct AgentCard {
    pub id: AgentId,
    pub name: String,
    pub description: String,
    pub capabilities: Vec<String>,
}

#[async_trait]
pub trait Agent: Send + Sync {
    fn identity(&self) -> &AgentIdentity;
    fn kind(&self) -> AgentKind;

    fn id(&self) -> &AgentId {
        &self.identity().id
    }

    fn name(&self) -> &str {
        &self.identity().name
    }

    fn capabilities(&self) -> &'static [&'static str] {
        self.kind().capabilities()
    }

    fn card(&self) -> AgentCard {
        let identity = self.identity();
        AgentCard {
            id: identity.id.clone(),
            name: identity.name.clone(),
            description: identity.description.clone(),
            capabilities: self.capabilities().iter().map(|c| c.to_string()).collect(),
        }
    }

    /// 领域失败返回 `AgentOutcome::Error`；只有基础设施故障才返回 `Err`
    async fn process(&self, input: MessageContent, context_id: Option<LoanId>)
        -> Result<AgentOutcome>;

    async fn receive_message(&self, envelope: MessageEnvelope) -> Result<AgentOutcome> {
        debug!(
            agent = self.name(),
            sender = %envelope.sender_name,
            task_id = %envelope.task_id,
            message_type = envelope.content.message_type(),
            "Received message"
        );
        self.process(envelope.content, None).await
    }
}
