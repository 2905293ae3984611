use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::agent::{Agent, AgentIdentity, AgentKind, AgentOutcome, ValidationAssessment};
use crate::error::{LoanFlowError, Result};
use crate::llm::StructuredOutput;
use crate::protocol::MessageContent;
use crate::store::{
    ApplicationForm, InteractionType, LoanId, LoanStore, NewApplicant, NewInteraction,
    NewLoanApplication,
};
use crate::workflow::{LoanStateMachine, TransitionOutcome, TransitionRejection, WorkflowState};

const VALIDATION_SYSTEM_PROMPT: &str = "\
You are an AI assistant specializing in loan application validation.
Please analyze the loan application data and check for:
1. Completeness of required fields
2. Basic eligibility criteria
3. Any inconsistencies or potential red flags

Return a structured assessment of the application.";

/// 申请受理智能体
pub struct ApplicationIntakeAgent {
    identity: AgentIdentity,
    store: Arc<dyn LoanStore>,
    state_machine: LoanStateMachine,
    llm: StructuredOutput,
}

impl ApplicationIntakeAgent {
    pub fn new(
        store: Arc<dyn LoanStore>,
        state_machine: LoanStateMachine,
        llm: StructuredOutput,
    ) -> Self {
        Self {
            identity: AgentIdentity::new(
                "Application Intake Agent",
                "Processes and validates new loan applications",
            ),
            store,
            state_machine,
            llm,
        }
    }

    /// 先做本地必填字段检查，再交给模型做结构化校验
    pub async fn validate_application(&self, form: &ApplicationForm) -> Result<ValidationAssessment> {
        let missing = form.missing_required_fields();
        if !missing.is_empty() {
            return Ok(ValidationAssessment::incomplete(missing));
        }

        // SSN 不发给模型
        let redacted = ApplicationForm {
            ssn: None,
            ..form.clone()
        };
        let data = serde_json::to_string_pretty(&redacted)?;
        let prompt = format!(
            "Please validate the following loan application data:\n\n\
             Application Data:\n{data}\n\n\
             Check for completeness, basic eligibility, and any inconsistencies."
        );

        match self
            .llm
            .generate::<ValidationAssessment>(
                &prompt,
                VALIDATION_SYSTEM_PROMPT,
                &ValidationAssessment::shape(),
            )
            .await
        {
            Ok(assessment) => Ok(assessment),
            Err(failure) => {
                warn!(%failure, "Application validation fell back to manual review");
                Ok(ValidationAssessment::needs_review(&failure))
            }
        }
    }

    async fn submit(&self, form: ApplicationForm) -> Result<AgentOutcome> {
        let assessment = self.validate_application(&form).await?;
        if !assessment.is_valid {
            info!(
                needs_review = assessment.needs_review,
                "Application validation failed"
            );
            return Ok(AgentOutcome::Error {
                message: "Application validation failed".into(),
                diagnostic: assessment.diagnostic.clone(),
                validation_result: Some(assessment),
            });
        }

        let application_data = serde_json::to_value(&form)?;
        let applicant_id = self.store.create_applicant(NewApplicant::from(&form)).await?;
        let loan_id = self
            .store
            .create_loan_application(NewLoanApplication {
                applicant_id,
                loan_type: form.loan_type.clone(),
                loan_amount: form.loan_amount,
                loan_purpose: form.loan_purpose.clone(),
                loan_term: form.loan_term,
                application_data: application_data.clone(),
            })
            .await?;

        // 受理必须整体生效：推进状态或写日志失败时撤销刚创建的申请
        if let Err(err) = self
            .open_application(loan_id, application_data, &assessment)
            .await
        {
            if let Err(discard_err) = self.store.discard_loan_application(loan_id).await {
                warn!(loan_id, %discard_err, "Failed to discard partially submitted application");
            }
            return Err(err);
        }

        info!(loan_id, applicant_id, "Application submitted");
        Ok(AgentOutcome::Success {
            message: "Application submitted successfully".into(),
            loan_application_id: Some(loan_id),
            validation_result: Some(assessment),
            document_results: Vec::new(),
        })
    }

    /// 推进到 `INITIAL_VALIDATION` 并记录校验交互
    async fn open_application(
        &self,
        loan_id: LoanId,
        application_data: serde_json::Value,
        assessment: &ValidationAssessment,
    ) -> Result<()> {
        let transition = self
            .state_machine
            .transition_to(loan_id, WorkflowState::InitialValidation)
            .await;
        match transition {
            TransitionOutcome::Applied { .. } => {}
            TransitionOutcome::Rejected(TransitionRejection::PersistenceFailed { detail }) => {
                return Err(LoanFlowError::Persistence(detail))
            }
            TransitionOutcome::Rejected(rejection) => {
                return Err(LoanFlowError::Persistence(rejection.to_string()))
            }
        }

        self.store
            .log_interaction(NewInteraction {
                loan_application_id: loan_id,
                agent_name: self.name().to_string(),
                interaction_type: InteractionType::ApplicationValidation,
                input_data: application_data,
                output_data: serde_json::to_value(assessment)?,
                notes: None,
            })
            .await?;
        Ok(())
    }
}

#[async_trait]
impl Agent for ApplicationIntakeAgent {
    fn identity(&self) -> &AgentIdentity {
        &self.identity
    }

    fn kind(&self) -> AgentKind {
        AgentKind::ApplicationIntake
    }

    async fn process(
        &self,
        input: MessageContent,
        context_id: Option<LoanId>,
    ) -> Result<AgentOutcome> {
        if context_id.is_some() {
            return Ok(AgentOutcome::error(
                "Operation not supported for existing applications",
            ));
        }
        match input {
            MessageContent::ApplicationSubmitted { application } => self.submit(application).await,
            other => Ok(AgentOutcome::error_with_diagnostic(
                "Unsupported input",
                format!(
                    "{} cannot handle message type {}",
                    self.name(),
                    other.message_type()
                ),
            )),
        }
    }
}
