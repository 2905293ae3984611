// 持久化协作者

mod memory;
mod models;

use async_trait::async_trait;

use crate::error::Result;
use crate::workflow::WorkflowState;

pub use memory::MemoryLoanStore;
pub use models::{
    AgentInteraction, Applicant, ApplicantId, ApplicationForm, Document, DocumentId,
    InteractionId, InteractionType, LoanApplication, LoanId, NewApplicant, NewInteraction,
    NewLoanApplication, StateHistoryEntry, VerificationStatus,
};

/// 贷款数据存储 trait
///
/// 状态历史与交互日志都是只追加的；`record_state` 必须在一次操作内
/// 比较当前状态、追加历史并更新当前状态，失败时不得留下部分记录。
#[async_trait]
pub trait LoanStore: Send + Sync {
    async fn create_applicant(&self, applicant: NewApplicant) -> Result<ApplicantId>;
    async fn get_applicant(&self, id: ApplicantId) -> Result<Option<Applicant>>;

    /// 新建的申请处于 `APPLICATION_SUBMITTED`，历史中只有这一条记录
    async fn create_loan_application(&self, loan: NewLoanApplication) -> Result<LoanId>;
    async fn get_loan_application(&self, id: LoanId) -> Result<Option<LoanApplication>>;

    /// 当前状态不等于 `expected` 时返回 `StateConflict`，不写入任何内容
    async fn record_state(
        &self,
        id: LoanId,
        expected: WorkflowState,
        state: WorkflowState,
    ) -> Result<StateHistoryEntry>;

    /// 删除申请及其申请人、文件与交互记录，用于受理中途失败后的补偿
    async fn discard_loan_application(&self, id: LoanId) -> Result<()>;

    async fn log_interaction(&self, interaction: NewInteraction) -> Result<InteractionId>;
    async fn interactions(&self, loan_id: LoanId) -> Result<Vec<AgentInteraction>>;

    async fn add_document(
        &self,
        loan_id: LoanId,
        document_type: &str,
        file_path: &str,
    ) -> Result<DocumentId>;
    async fn documents(&self, loan_id: LoanId) -> Result<Vec<Document>>;
    async fn update_document_verification(
        &self,
        id: DocumentId,
        status: VerificationStatus,
        notes: Option<String>,
    ) -> Result<()>;

    /// 最近一次申请校验的总体评估
    async fn latest_validation_assessment(&self, loan_id: LoanId) -> Result<Option<String>> {
        let interactions = self.interactions(loan_id).await?;
        Ok(interactions
            .iter()
            .rev()
            .find(|entry| entry.interaction_type == InteractionType::ApplicationValidation)
            .and_then(|entry| entry.output_data.get("overall_assessment"))
            .and_then(|value| value.as_str())
            .map(str::to_string))
    }
}
