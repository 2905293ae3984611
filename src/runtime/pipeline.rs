use std::sync::Arc;

use anyhow::anyhow;
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::agent::{
    AgentOutcome, AgentRegistry, ApplicationIntakeAgent, DocumentVerificationAgent,
};
use crate::config::LoanFlowConfig;
use crate::error::{LoanFlowError, Result};
use crate::ids::{AgentId, TaskId};
use crate::llm::{DynLlmClient, StructuredOutput};
use crate::protocol::{MessageContent, MessageExchange, TaskPayload, TaskRegistry};
use crate::store::{ApplicationForm, Document, DocumentId, LoanId, LoanStore, StateHistoryEntry};
use crate::workflow::{LoanStateMachine, TransitionOutcome, WorkflowState};

/// 负责文件核验的能力名
pub const VERIFICATION_CAPABILITY: &str = "verify_identity_documents";

#[derive(Clone, Debug, Serialize)]
pub struct VerificationStep {
    pub task_id: TaskId,
    pub outcome: AgentOutcome,
}

#[derive(Clone, Debug, Serialize)]
pub struct SubmissionReport {
    pub intake: AgentOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification: Option<VerificationStep>,
}

impl SubmissionReport {
    pub fn loan_application_id(&self) -> Option<LoanId> {
        self.intake.loan_application_id()
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct ProcessingReport {
    pub verification: VerificationStep,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transition: Option<TransitionOutcome>,
}

#[derive(Clone, Debug, Serialize)]
pub struct LoanStatus {
    pub loan_application_id: LoanId,
    pub current_state: WorkflowState,
    pub state_history: Vec<StateHistoryEntry>,
    pub possible_transitions: Vec<WorkflowState>,
    pub documents: Vec<Document>,
    pub interactions: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_assessment: Option<String>,
}

/// 贷款处理流水线
///
/// 启动时构建一次，持有注册表、消息交换与状态机，按需传给调用方。
pub struct LoanPipeline {
    store: Arc<dyn LoanStore>,
    agents: Arc<AgentRegistry>,
    tasks: Arc<TaskRegistry>,
    exchange: MessageExchange,
    state_machine: LoanStateMachine,
    intake_id: AgentId,
}

impl LoanPipeline {
    pub fn new(
        store: Arc<dyn LoanStore>,
        llm: DynLlmClient,
        config: &LoanFlowConfig,
    ) -> Result<Self> {
        let structured =
            StructuredOutput::new(llm, config.llm_timeout()).with_temperature(config.temperature);
        let state_machine = LoanStateMachine::new(Arc::clone(&store));
        let agents = Arc::new(AgentRegistry::new());

        let intake_id = agents.register(Arc::new(ApplicationIntakeAgent::new(
            Arc::clone(&store),
            state_machine.clone(),
            structured.clone(),
        )))?;
        agents.register(Arc::new(DocumentVerificationAgent::new(
            Arc::clone(&store),
            structured,
        )))?;

        let tasks = Arc::new(TaskRegistry::new(Arc::clone(&agents)));
        let exchange = MessageExchange::new(Arc::clone(&agents), Arc::clone(&tasks));
        Ok(Self {
            store,
            agents,
            tasks,
            exchange,
            state_machine,
            intake_id,
        })
    }

    pub fn store(&self) -> &Arc<dyn LoanStore> {
        &self.store
    }

    pub fn agents(&self) -> &Arc<AgentRegistry> {
        &self.agents
    }

    pub fn tasks(&self) -> &Arc<TaskRegistry> {
        &self.tasks
    }

    pub fn exchange(&self) -> &MessageExchange {
        &self.exchange
    }

    pub fn state_machine(&self) -> &LoanStateMachine {
        &self.state_machine
    }

    pub fn intake_agent_id(&self) -> &AgentId {
        &self.intake_id
    }

    /// 受理申请；成功后立即向核验智能体发起文件核验请求
    #[instrument(skip_all)]
    pub async fn submit_application(&self, form: ApplicationForm) -> Result<SubmissionReport> {
        let intake = self.agents.get(&self.intake_id)?;
        let outcome = intake
            .process(MessageContent::ApplicationSubmitted { application: form }, None)
            .await?;

        let Some(loan_id) = outcome.loan_application_id() else {
            info!(message = outcome.message(), "Application not accepted");
            return Ok(SubmissionReport {
                intake: outcome,
                verification: None,
            });
        };

        let verification = self.request_document_verification(loan_id).await?;
        Ok(SubmissionReport {
            intake: outcome,
            verification: Some(verification),
        })
    }

    /// 创建核验任务、分配给具备核验能力的智能体并同步发送请求
    ///
    /// 发送失败时任务以错误结果结束，错误继续返回给调用方。
    #[instrument(skip(self))]
    pub async fn request_document_verification(&self, loan_id: LoanId) -> Result<VerificationStep> {
        let verifier = self
            .agents
            .find_by_capability(VERIFICATION_CAPABILITY)
            .ok_or_else(|| {
                LoanFlowError::Other(anyhow!(
                    "no agent provides capability `{VERIFICATION_CAPABILITY}`"
                ))
            })?;

        let task_id = self.tasks.create_task(
            TaskPayload::DocumentVerificationNeeded {
                loan_application_id: loan_id,
            },
            &self.intake_id,
        );
        self.tasks.assign(&task_id, &verifier)?;

        let sent = self
            .exchange
            .send(
                &self.intake_id,
                &verifier,
                &task_id,
                MessageContent::DocumentVerificationNeeded {
                    loan_application_id: loan_id,
                },
            )
            .await;
        let outcome = match sent {
            Ok(outcome) => outcome,
            Err(err) => {
                // 投递失败也要结束任务，结果记为错误
                warn!(loan_id, task_id = %task_id, %err, "Document verification delivery failed");
                self.tasks.complete(
                    &task_id,
                    AgentOutcome::error_with_diagnostic(
                        "Document verification failed",
                        err.to_string(),
                    ),
                )?;
                return Err(err);
            }
        };
        self.tasks.complete(&task_id, outcome.clone())?;

        Ok(VerificationStep { task_id, outcome })
    }

    pub async fn upload_document(
        &self,
        loan_id: LoanId,
        document_type: &str,
        file_path: &str,
    ) -> Result<DocumentId> {
        self.store
            .add_document(loan_id, document_type, file_path)
            .await
    }

    /// 核验已上传的文件，成功后推进到 `DOCUMENT_VERIFICATION`
    pub async fn process_documents(&self, loan_id: LoanId) -> Result<ProcessingReport> {
        let verification = self.request_document_verification(loan_id).await?;
        let transition = if verification.outcome.is_success() {
            let transition = self
                .state_machine
                .transition_to(loan_id, WorkflowState::DocumentVerification)
                .await;
            if !transition.success() {
                warn!(loan_id, message = %transition.message(), "Loan state not advanced");
            }
            Some(transition)
        } else {
            None
        };
        Ok(ProcessingReport {
            verification,
            transition,
        })
    }

    pub async fn advance(&self, loan_id: LoanId, target: &str) -> TransitionOutcome {
        self.state_machine.transition(loan_id, target).await
    }

    pub async fn status(&self, loan_id: LoanId) -> Result<LoanStatus> {
        let loan = self
            .store
            .get_loan_application(loan_id)
            .await?
            .ok_or(LoanFlowError::LoanNotFound(loan_id))?;
        let documents = self.store.documents(loan_id).await?;
        let interactions = self.store.interactions(loan_id).await?.len();
        let latest_assessment = self.store.latest_validation_assessment(loan_id).await?;
        Ok(LoanStatus {
            loan_application_id: loan_id,
            current_state: loan.current_state,
            possible_transitions: loan.current_state.next_states().to_vec(),
            state_history: loan.state_history,
            documents,
            interactions,
            latest_assessment,
        })
    }
}
