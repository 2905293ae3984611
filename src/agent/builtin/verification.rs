use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::{info, warn};

use crate::agent::{
    Agent, AgentIdentity, AgentKind, AgentOutcome, DocumentVerification,
    DocumentVerificationResult,
};
use crate::error::Result;
use crate::llm::StructuredOutput;
use crate::protocol::MessageContent;
use crate::store::{Document, InteractionType, LoanId, LoanStore, NewInteraction};

/// 文件核验智能体
pub struct DocumentVerificationAgent {
    identity: AgentIdentity,
    store: Arc<dyn LoanStore>,
    llm: StructuredOutput,
}

impl DocumentVerificationAgent {
    pub fn new(store: Arc<dyn LoanStore>, llm: StructuredOutput) -> Self {
        Self {
            identity: AgentIdentity::new(
                "Document Verification Agent",
                "Verifies submitted documents for loan applications",
            ),
            store,
            llm,
        }
    }

    pub async fn verify_document(&self, document: &Document) -> DocumentVerification {
        let system = format!(
            "You are an AI assistant specializing in document verification for loan applications.\n\
             Please analyze the following {} document and provide a verification assessment.",
            document.document_type
        );
        let prompt = format!(
            "Please verify the following document:\n\n\
             Document Type: {}\n\
             Document Source: {}\n\n\
             Provide a verification assessment based on the document type.",
            document.document_type, document.file_path
        );

        match self
            .llm
            .generate::<DocumentVerification>(&prompt, &system, &DocumentVerification::shape())
            .await
        {
            Ok(verification) => verification,
            Err(failure) => {
                warn!(document_id = document.id, %failure, "Document needs manual review");
                DocumentVerification::needs_review(&failure)
            }
        }
    }

    async fn verify_loan(&self, loan_id: LoanId) -> Result<AgentOutcome> {
        let documents = self.store.documents(loan_id).await?;
        let mut document_results = Vec::with_capacity(documents.len());
        for document in &documents {
            let verification = self.verify_document(document).await;
            self.store
                .update_document_verification(
                    document.id,
                    verification.verification_status,
                    Some(verification.verification_notes.clone()),
                )
                .await?;
            document_results.push(DocumentVerificationResult {
                document_id: document.id,
                document_type: document.document_type.clone(),
                verification,
            });
        }

        let outcome = AgentOutcome::Success {
            message: "Document verification requested".into(),
            loan_application_id: Some(loan_id),
            validation_result: None,
            document_results,
        };
        self.store
            .log_interaction(NewInteraction {
                loan_application_id: loan_id,
                agent_name: self.name().to_string(),
                interaction_type: InteractionType::DocumentVerificationRequest,
                input_data: json!({ "loan_application_id": loan_id }),
                output_data: outcome.to_value()?,
                notes: None,
            })
            .await?;

        info!(loan_id, documents = documents.len(), "Document verification requested");
        Ok(outcome)
    }
}

#[async_trait]
impl Agent for DocumentVerificationAgent {
    fn identity(&self) -> &AgentIdentity {
        &self.identity
    }

    fn kind(&self) -> AgentKind {
        AgentKind::DocumentVerification
    }

    async fn process(
        &self,
        input: MessageContent,
        context_id: Option<LoanId>,
    ) -> Result<AgentOutcome> {
        let loan_id = match input {
            MessageContent::DocumentVerificationNeeded {
                loan_application_id,
            } => Some(loan_application_id),
            _ => context_id,
        };
        match loan_id {
            Some(loan_id) => self.verify_loan(loan_id).await,
            None => Ok(AgentOutcome::error("Loan application ID is required")),
        }
    }
}
