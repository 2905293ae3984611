use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::workflow::WorkflowState;

pub type LoanId = u64;
pub type ApplicantId = u64;
pub type DocumentId = u64;
pub type InteractionId = u64;

/// 贷款申请表单
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct ApplicationForm {
    #[serde(default)]
    pub applicant_name: Option<String>,
    #[serde(default)]
    pub applicant_email: Option<String>,
    #[serde(default)]
    pub applicant_phone: Option<String>,
    #[serde(default)]
    pub applicant_address: Option<String>,
    #[serde(default)]
    pub date_of_birth: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssn: Option<String>,
    #[serde(default)]
    pub employment_status: Option<String>,
    #[serde(default)]
    pub employer: Option<String>,
    #[serde(default)]
    pub annual_income: Option<f64>,
    #[serde(default)]
    pub loan_type: Option<String>,
    #[serde(default)]
    pub loan_amount: Option<f64>,
    #[serde(default)]
    pub loan_purpose: Option<String>,
    /// 期限（月）
    #[serde(default)]
    pub loan_term: Option<u32>,
}

impl ApplicationForm {
    /// 必填字段中缺失（或为空白）的字段名
    pub fn missing_required_fields(&self) -> Vec<String> {
        let mut missing = Vec::new();
        let blank = |value: &Option<String>| value.as_deref().map_or(true, |v| v.trim().is_empty());
        if blank(&self.applicant_name) {
            missing.push("applicant_name".to_string());
        }
        if blank(&self.applicant_email) {
            missing.push("applicant_email".to_string());
        }
        if blank(&self.loan_type) {
            missing.push("loan_type".to_string());
        }
        if self.loan_amount.map_or(true, |amount| amount <= 0.0) {
            missing.push("loan_amount".to_string());
        }
        missing
    }

    pub fn parsed_date_of_birth(&self) -> Option<NaiveDate> {
        self.date_of_birth
            .as_deref()
            .and_then(|raw| NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Applicant {
    pub id: ApplicantId,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub ssn: Option<String>,
    pub employment_status: Option<String>,
    pub employer: Option<String>,
    pub annual_income: Option<f64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Default)]
pub struct NewApplicant {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub ssn: Option<String>,
    pub employment_status: Option<String>,
    pub employer: Option<String>,
    pub annual_income: Option<f64>,
}

impl From<&ApplicationForm> for NewApplicant {
    fn from(form: &ApplicationForm) -> Self {
        Self {
            name: form.applicant_name.clone().unwrap_or_default(),
            email: form.applicant_email.clone().unwrap_or_default(),
            phone: form.applicant_phone.clone(),
            address: form.applicant_address.clone(),
            date_of_birth: form.parsed_date_of_birth(),
            ssn: form.ssn.clone(),
            employment_status: form.employment_status.clone(),
            employer: form.employer.clone(),
            annual_income: form.annual_income,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct StateHistoryEntry {
    pub state: WorkflowState,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<WorkflowState>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LoanApplication {
    pub id: LoanId,
    pub applicant_id: ApplicantId,
    pub loan_type: Option<String>,
    pub loan_amount: Option<f64>,
    pub loan_purpose: Option<String>,
    pub loan_term: Option<u32>,
    pub interest_rate: Option<f64>,
    pub current_state: WorkflowState,
    pub state_history: Vec<StateHistoryEntry>,
    pub application_data: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LoanApplication {
    /// 从第一条历史记录开始重放，返回重建出的当前状态。
    ///
    /// 若某条记录的 `from` 与上一条记录的状态不一致，返回 `None`。
    pub fn replay_history(&self) -> Option<WorkflowState> {
        let mut entries = self.state_history.iter();
        let mut current = entries.next()?.state;
        for entry in entries {
            if entry.from != Some(current) {
                return None;
            }
            current = entry.state;
        }
        Some(current)
    }
}

#[derive(Clone, Debug)]
pub struct NewLoanApplication {
    pub applicant_id: ApplicantId,
    pub loan_type: Option<String>,
    pub loan_amount: Option<f64>,
    pub loan_purpose: Option<String>,
    pub loan_term: Option<u32>,
    pub application_data: Value,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerificationStatus {
    Pending,
    Verified,
    NeedsReview,
    Rejected,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub loan_application_id: LoanId,
    pub document_type: String,
    pub file_path: String,
    pub verification_status: VerificationStatus,
    pub verification_notes: Option<String>,
    pub uploaded_at: DateTime<Utc>,
    pub verified_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InteractionType {
    ApplicationValidation,
    DocumentVerificationRequest,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AgentInteraction {
    pub id: InteractionId,
    pub loan_application_id: LoanId,
    pub agent_name: String,
    pub interaction_type: InteractionType,
    pub input_data: Value,
    pub output_data: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug)]
pub struct NewInteraction {
    pub loan_application_id: LoanId,
    pub agent_name: String,
    pub interaction_type: InteractionType,
    pub input_data: Value,
    pub output_data: Value,
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn loan_with_history(history: Vec<StateHistoryEntry>) -> LoanApplication {
        let current_state = history
            .last()
            .map(|entry| entry.state)
            .unwrap_or(WorkflowState::ApplicationSubmitted);
        LoanApplication {
            id: 1,
            applicant_id: 1,
            loan_type: None,
            loan_amount: None,
            loan_purpose: None,
            loan_term: None,
            interest_rate: None,
            current_state,
            state_history: history,
            application_data: json!({}),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn replay_reconstructs_current_state() {
        let now = Utc::now();
        let loan = loan_with_history(vec![
            StateHistoryEntry {
                state: WorkflowState::ApplicationSubmitted,
                timestamp: now,
                from: None,
            },
            StateHistoryEntry {
                state: WorkflowState::InitialValidation,
                timestamp: now,
                from: Some(WorkflowState::ApplicationSubmitted),
            },
        ]);
        assert_eq!(loan.replay_history(), Some(WorkflowState::InitialValidation));
    }

    #[test]
    fn replay_detects_broken_chain() {
        let now = Utc::now();
        let loan = loan_with_history(vec![
            StateHistoryEntry {
                state: WorkflowState::ApplicationSubmitted,
                timestamp: now,
                from: None,
            },
            StateHistoryEntry {
                state: WorkflowState::RiskAnalysis,
                timestamp: now,
                from: Some(WorkflowState::CreditAssessment),
            },
        ]);
        assert_eq!(loan.replay_history(), None);
    }

    #[test]
    fn missing_required_fields_are_reported() {
        let form = ApplicationForm {
            applicant_name: Some("  ".into()),
            loan_amount: Some(0.0),
            ..Default::default()
        };
        assert_eq!(
            form.missing_required_fields(),
            vec!["applicant_name", "applicant_email", "loan_type", "loan_amount"]
        );
    }

    #[test]
    fn invalid_date_of_birth_is_dropped() {
        let mut form = ApplicationForm {
            date_of_birth: Some("1990-02-30".into()),
            ..Default::default()
        };
        assert!(form.parsed_date_of_birth().is_none());
        form.date_of_birth = Some("1990-02-28".into());
        assert_eq!(
            form.parsed_date_of_birth(),
            NaiveDate::from_ymd_opt(1990, 2, 28)
        );
    }
}
