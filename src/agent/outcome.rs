use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::Result;
use crate::llm::GenerationFailure;
use crate::store::{DocumentId, LoanId, VerificationStatus};

const PROCESSING_ERROR: &str = "Error processing application";
const DOCUMENT_ERROR: &str = "Error processing document";

/// 智能体处理结果
///
/// 领域内的失败（校验不通过、上游生成失败）以 `Error` 返回，而不是 `Err`。
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum AgentOutcome {
    Success {
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        loan_application_id: Option<LoanId>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        validation_result: Option<ValidationAssessment>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        document_results: Vec<DocumentVerificationResult>,
    },
    Error {
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        validation_result: Option<ValidationAssessment>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        diagnostic: Option<String>,
    },
}

impl AgentOutcome {
    pub fn success(message: impl Into<String>, loan_application_id: Option<LoanId>) -> Self {
        AgentOutcome::Success {
            message: message.into(),
            loan_application_id,
            validation_result: None,
            document_results: Vec::new(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        AgentOutcome::Error {
            message: message.into(),
            validation_result: None,
            diagnostic: None,
        }
    }

    pub fn error_with_diagnostic(message: impl Into<String>, diagnostic: impl Into<String>) -> Self {
        AgentOutcome::Error {
            message: message.into(),
            validation_result: None,
            diagnostic: Some(diagnostic.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, AgentOutcome::Success { .. })
    }

    pub fn message(&self) -> &str {
        match self {
            AgentOutcome::Success { message, .. } | AgentOutcome::Error { message, .. } => message,
        }
    }

    pub fn loan_application_id(&self) -> Option<LoanId> {
        match self {
            AgentOutcome::Success {
                loan_application_id,
                ..
            } => *loan_application_id,
            AgentOutcome::Error { .. } => None,
        }
    }

    pub fn validation_result(&self) -> Option<&ValidationAssessment> {
        match self {
            AgentOutcome::Success {
                validation_result, ..
            }
            | AgentOutcome::Error {
                validation_result, ..
            } => validation_result.as_ref(),
        }
    }

    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct CompletenessCheck {
    #[serde(default)]
    pub is_complete: bool,
    #[serde(default)]
    pub missing_fields: Vec<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct EligibilityCheck {
    #[serde(default)]
    pub is_eligible: bool,
    #[serde(default)]
    pub reasons: Vec<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct ConsistencyCheck {
    #[serde(default)]
    pub is_consistent: bool,
    #[serde(default)]
    pub inconsistencies: Vec<String>,
}

/// 申请校验评估
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ValidationAssessment {
    pub is_valid: bool,
    #[serde(default)]
    pub completeness_check: CompletenessCheck,
    #[serde(default)]
    pub eligibility_check: EligibilityCheck,
    #[serde(default)]
    pub consistency_check: ConsistencyCheck,
    #[serde(default)]
    pub overall_assessment: String,
    #[serde(default)]
    pub needs_review: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<String>,
}

impl ValidationAssessment {
    /// 发给模型的输出结构模板
    pub fn shape() -> Value {
        json!({
            "is_valid": true,
            "completeness_check": {
                "is_complete": true,
                "missing_fields": []
            },
            "eligibility_check": {
                "is_eligible": true,
                "reasons": []
            },
            "consistency_check": {
                "is_consistent": true,
                "inconsistencies": []
            },
            "overall_assessment": ""
        })
    }

    /// 上游生成失败时的保守默认值
    pub fn needs_review(failure: &GenerationFailure) -> Self {
        let marker = vec![PROCESSING_ERROR.to_string()];
        Self {
            is_valid: false,
            completeness_check: CompletenessCheck {
                is_complete: false,
                missing_fields: marker.clone(),
            },
            eligibility_check: EligibilityCheck {
                is_eligible: false,
                reasons: marker.clone(),
            },
            consistency_check: ConsistencyCheck {
                is_consistent: false,
                inconsistencies: marker,
            },
            overall_assessment: PROCESSING_ERROR.to_string(),
            needs_review: true,
            diagnostic: Some(failure.to_string()),
        }
    }

    pub fn incomplete(missing_fields: Vec<String>) -> Self {
        Self {
            is_valid: false,
            overall_assessment: format!(
                "Application is missing required fields: {}",
                missing_fields.join(", ")
            ),
            completeness_check: CompletenessCheck {
                is_complete: false,
                missing_fields,
            },
            eligibility_check: EligibilityCheck::default(),
            consistency_check: ConsistencyCheck {
                is_consistent: true,
                inconsistencies: Vec::new(),
            },
            needs_review: false,
            diagnostic: None,
        }
    }
}

/// 单份文件的核验结论
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DocumentVerification {
    pub verification_status: VerificationStatus,
    #[serde(default)]
    pub confidence_score: f64,
    #[serde(default)]
    pub verification_notes: String,
    #[serde(default)]
    pub detected_issues: Vec<String>,
}

impl DocumentVerification {
    pub fn shape() -> Value {
        json!({
            "verification_status": "VERIFIED",
            "confidence_score": 0.0,
            "verification_notes": "",
            "detected_issues": []
        })
    }

    pub fn needs_review(failure: &GenerationFailure) -> Self {
        Self {
            verification_status: VerificationStatus::NeedsReview,
            confidence_score: 0.0,
            verification_notes: format!("{DOCUMENT_ERROR}: {failure}"),
            detected_issues: vec![DOCUMENT_ERROR.to_string()],
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DocumentVerificationResult {
    pub document_id: DocumentId,
    pub document_type: String,
    #[serde(flatten)]
    pub verification: DocumentVerification,
}
