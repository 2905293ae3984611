use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;

use super::models::*;
use super::LoanStore;
use crate::error::{LoanFlowError, Result};
use crate::workflow::WorkflowState;

#[derive(Default)]
struct Tables {
    applicants: BTreeMap<ApplicantId, Applicant>,
    loans: BTreeMap<LoanId, LoanApplication>,
    documents: BTreeMap<DocumentId, Document>,
    interactions: Vec<AgentInteraction>,
    next_applicant: ApplicantId,
    next_loan: LoanId,
    next_document: DocumentId,
    next_interaction: InteractionId,
}

fn next_id(counter: &mut u64) -> u64 {
    *counter += 1;
    *counter
}

/// 内存存储实现
#[derive(Default)]
pub struct MemoryLoanStore {
    inner: RwLock<Tables>,
}

impl MemoryLoanStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn loan_count(&self) -> usize {
        self.inner.read().loans.len()
    }

    pub fn applicant_count(&self) -> usize {
        self.inner.read().applicants.len()
    }
}

#[async_trait]
impl LoanStore for MemoryLoanStore {
    async fn create_applicant(&self, applicant: NewApplicant) -> Result<ApplicantId> {
        let mut tables = self.inner.write();
        let id = next_id(&mut tables.next_applicant);
        tables.applicants.insert(
            id,
            Applicant {
                id,
                name: applicant.name,
                email: applicant.email,
                phone: applicant.phone,
                address: applicant.address,
                date_of_birth: applicant.date_of_birth,
                ssn: applicant.ssn,
                employment_status: applicant.employment_status,
                employer: applicant.employer,
                annual_income: applicant.annual_income,
                created_at: Utc::now(),
            },
        );
        Ok(id)
    }

    async fn get_applicant(&self, id: ApplicantId) -> Result<Option<Applicant>> {
        Ok(self.inner.read().applicants.get(&id).cloned())
    }

    async fn create_loan_application(&self, loan: NewLoanApplication) -> Result<LoanId> {
        let mut tables = self.inner.write();
        let id = next_id(&mut tables.next_loan);
        let now = Utc::now();
        tables.loans.insert(
            id,
            LoanApplication {
                id,
                applicant_id: loan.applicant_id,
                loan_type: loan.loan_type,
                loan_amount: loan.loan_amount,
                loan_purpose: loan.loan_purpose,
                loan_term: loan.loan_term,
                interest_rate: None,
                current_state: WorkflowState::ApplicationSubmitted,
                state_history: vec![StateHistoryEntry {
                    state: WorkflowState::ApplicationSubmitted,
                    timestamp: now,
                    from: None,
                }],
                application_data: loan.application_data,
                created_at: now,
                updated_at: now,
            },
        );
        Ok(id)
    }

    async fn get_loan_application(&self, id: LoanId) -> Result<Option<LoanApplication>> {
        Ok(self.inner.read().loans.get(&id).cloned())
    }

    async fn record_state(
        &self,
        id: LoanId,
        expected: WorkflowState,
        state: WorkflowState,
    ) -> Result<StateHistoryEntry> {
        let mut tables = self.inner.write();
        let loan = tables
            .loans
            .get_mut(&id)
            .ok_or(LoanFlowError::LoanNotFound(id))?;
        if loan.current_state != expected {
            return Err(LoanFlowError::StateConflict {
                loan_id: id,
                expected,
                actual: loan.current_state,
            });
        }
        let now = Utc::now();
        let entry = StateHistoryEntry {
            state,
            timestamp: now,
            from: Some(loan.current_state),
        };
        loan.state_history.push(entry.clone());
        loan.current_state = state;
        loan.updated_at = now;
        Ok(entry)
    }

    async fn discard_loan_application(&self, id: LoanId) -> Result<()> {
        let mut tables = self.inner.write();
        let loan = tables
            .loans
            .remove(&id)
            .ok_or(LoanFlowError::LoanNotFound(id))?;
        let applicant_in_use = tables
            .loans
            .values()
            .any(|other| other.applicant_id == loan.applicant_id);
        if !applicant_in_use {
            tables.applicants.remove(&loan.applicant_id);
        }
        tables.documents.retain(|_, doc| doc.loan_application_id != id);
        tables.interactions.retain(|entry| entry.loan_application_id != id);
        Ok(())
    }

    async fn log_interaction(&self, interaction: NewInteraction) -> Result<InteractionId> {
        let mut tables = self.inner.write();
        let id = next_id(&mut tables.next_interaction);
        tables.interactions.push(AgentInteraction {
            id,
            loan_application_id: interaction.loan_application_id,
            agent_name: interaction.agent_name,
            interaction_type: interaction.interaction_type,
            input_data: interaction.input_data,
            output_data: interaction.output_data,
            notes: interaction.notes,
            created_at: Utc::now(),
        });
        Ok(id)
    }

    async fn interactions(&self, loan_id: LoanId) -> Result<Vec<AgentInteraction>> {
        Ok(self
            .inner
            .read()
            .interactions
            .iter()
            .filter(|entry| entry.loan_application_id == loan_id)
            .cloned()
            .collect())
    }

    async fn add_document(
        &self,
        loan_id: LoanId,
        document_type: &str,
        file_path: &str,
    ) -> Result<DocumentId> {
        let mut tables = self.inner.write();
        if !tables.loans.contains_key(&loan_id) {
            return Err(LoanFlowError::LoanNotFound(loan_id));
        }
        let id = next_id(&mut tables.next_document);
        tables.documents.insert(
            id,
            Document {
                id,
                loan_application_id: loan_id,
                document_type: document_type.to_string(),
                file_path: file_path.to_string(),
                verification_status: VerificationStatus::Pending,
                verification_notes: None,
                uploaded_at: Utc::now(),
                verified_at: None,
            },
        );
        Ok(id)
    }

    async fn documents(&self, loan_id: LoanId) -> Result<Vec<Document>> {
        Ok(self
            .inner
            .read()
            .documents
            .values()
            .filter(|doc| doc.loan_application_id == loan_id)
            .cloned()
            .collect())
    }

    async fn update_document_verification(
        &self,
        id: DocumentId,
        status: VerificationStatus,
        notes: Option<String>,
    ) -> Result<()> {
        let mut tables = self.inner.write();
        let document = tables
            .documents
            .get_mut(&id)
            .ok_or(LoanFlowError::DocumentNotFound(id))?;
        document.verification_status = status;
        document.verification_notes = notes;
        document.verified_at = Some(Utc::now());
        Ok(())
    }
}
