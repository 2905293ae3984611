#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::json;

use loanflow::store::{
    AgentInteraction, Applicant, ApplicantId, Document, DocumentId, InteractionId,
    LoanApplication, NewApplicant, NewInteraction, NewLoanApplication, StateHistoryEntry,
};
use loanflow::{
    LoanFlowError, LoanId, LoanStore, MemoryLoanStore, VerificationStatus, WorkflowState,
};

/// 包装内存存储，按需注入写入失败或在读取后让出执行权
#[derive(Default)]
pub struct FaultyStore {
    pub inner: MemoryLoanStore,
    fail_record_state: bool,
    fail_documents: bool,
    yield_after_read: bool,
}

impl FaultyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_record_state(mut self) -> Self {
        self.fail_record_state = true;
        self
    }

    pub fn failing_documents(mut self) -> Self {
        self.fail_documents = true;
        self
    }

    /// 读取申请后让出一次，使并发调用在校验与写入之间交错
    pub fn yielding_after_read(mut self) -> Self {
        self.yield_after_read = true;
        self
    }
}

#[async_trait]
impl LoanStore for FaultyStore {
    async fn create_applicant(&self, applicant: NewApplicant) -> loanflow::Result<ApplicantId> {
        self.inner.create_applicant(applicant).await
    }

    async fn get_applicant(&self, id: ApplicantId) -> loanflow::Result<Option<Applicant>> {
        self.inner.get_applicant(id).await
    }

    async fn create_loan_application(&self, loan: NewLoanApplication) -> loanflow::Result<LoanId> {
        self.inner.create_loan_application(loan).await
    }

    async fn get_loan_application(&self, id: LoanId) -> loanflow::Result<Option<LoanApplication>> {
        let loan = self.inner.get_loan_application(id).await;
        if self.yield_after_read {
            tokio::task::yield_now().await;
        }
        loan
    }

    async fn record_state(
        &self,
        id: LoanId,
        expected: WorkflowState,
        state: WorkflowState,
    ) -> loanflow::Result<StateHistoryEntry> {
        if self.fail_record_state {
            return Err(LoanFlowError::Persistence("disk full".into()));
        }
        self.inner.record_state(id, expected, state).await
    }

    async fn discard_loan_application(&self, id: LoanId) -> loanflow::Result<()> {
        self.inner.discard_loan_application(id).await
    }

    async fn log_interaction(&self, interaction: NewInteraction) -> loanflow::Result<InteractionId> {
        self.inner.log_interaction(interaction).await
    }

    async fn interactions(&self, loan_id: LoanId) -> loanflow::Result<Vec<AgentInteraction>> {
        self.inner.interactions(loan_id).await
    }

    async fn add_document(
        &self,
        loan_id: LoanId,
        document_type: &str,
        file_path: &str,
    ) -> loanflow::Result<DocumentId> {
        self.inner.add_document(loan_id, document_type, file_path).await
    }

    async fn documents(&self, loan_id: LoanId) -> loanflow::Result<Vec<Document>> {
        if self.fail_documents {
            return Err(LoanFlowError::Persistence("document index offline".into()));
        }
        self.inner.documents(loan_id).await
    }

    async fn update_document_verification(
        &self,
        id: DocumentId,
        status: VerificationStatus,
        notes: Option<String>,
    ) -> loanflow::Result<()> {
        self.inner.update_document_verification(id, status, notes).await
    }
}

pub async fn new_loan(store: &dyn LoanStore) -> LoanId {
    let applicant_id = store
        .create_applicant(NewApplicant {
            name: "Grace".into(),
            email: "grace@example.com".into(),
            ..Default::default()
        })
        .await
        .unwrap();
    store
        .create_loan_application(NewLoanApplication {
            applicant_id,
            loan_type: Some("mortgage".into()),
            loan_amount: Some(250_000.0),
            loan_purpose: Some("house".into()),
            loan_term: Some(360),
            application_data: json!({}),
        })
        .await
        .unwrap()
}

/// 不经状态机校验，直接把新建的申请写到 `state`
pub async fn force_state(store: &dyn LoanStore, loan_id: LoanId, state: WorkflowState) {
    if state != WorkflowState::ApplicationSubmitted {
        store
            .record_state(loan_id, WorkflowState::ApplicationSubmitted, state)
            .await
            .unwrap();
    }
}

pub fn approving_reply() -> String {
    json!({
        "is_valid": true,
        "completeness_check": { "is_complete": true, "missing_fields": [] },
        "eligibility_check": { "is_eligible": true, "reasons": [] },
        "consistency_check": { "is_consistent": true, "inconsistencies": [] },
        "overall_assessment": "Looks good",
        "verification_status": "VERIFIED",
        "confidence_score": 0.93,
        "verification_notes": "Matches applicant",
        "detected_issues": []
    })
    .to_string()
}
