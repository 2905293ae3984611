use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// 贷款申请的工作流状态
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkflowState {
    ApplicationSubmitted,
    InitialValidation,
    DocumentVerification,
    CreditAssessment,
    RiskAnalysis,
    ComplianceCheck,
    DecisionMaking,
    Communication,
    Completed,
}

impl WorkflowState {
    pub const ALL: [WorkflowState; 9] = [
        WorkflowState::ApplicationSubmitted,
        WorkflowState::InitialValidation,
        WorkflowState::DocumentVerification,
        WorkflowState::CreditAssessment,
        WorkflowState::RiskAnalysis,
        WorkflowState::ComplianceCheck,
        WorkflowState::DecisionMaking,
        WorkflowState::Communication,
        WorkflowState::Completed,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            WorkflowState::ApplicationSubmitted => "APPLICATION_SUBMITTED",
            WorkflowState::InitialValidation => "INITIAL_VALIDATION",
            WorkflowState::DocumentVerification => "DOCUMENT_VERIFICATION",
            WorkflowState::CreditAssessment => "CREDIT_ASSESSMENT",
            WorkflowState::RiskAnalysis => "RISK_ANALYSIS",
            WorkflowState::ComplianceCheck => "COMPLIANCE_CHECK",
            WorkflowState::DecisionMaking => "DECISION_MAKING",
            WorkflowState::Communication => "COMMUNICATION",
            WorkflowState::Completed => "COMPLETED",
        }
    }

    /// 静态转换表
    pub fn next_states(self) -> &'static [WorkflowState] {
        use WorkflowState::*;
        match self {
            ApplicationSubmitted => &[InitialValidation],
            InitialValidation => &[DocumentVerification, Communication],
            DocumentVerification => &[CreditAssessment, Communication],
            CreditAssessment => &[RiskAnalysis, Communication],
            RiskAnalysis => &[ComplianceCheck, Communication],
            ComplianceCheck => &[DecisionMaking, Communication],
            DecisionMaking => &[Communication, Completed],
            Communication => &[Completed, DocumentVerification],
            Completed => &[],
        }
    }

    pub fn can_transition_to(self, target: WorkflowState) -> bool {
        self.next_states().contains(&target)
    }

    pub fn is_terminal(self) -> bool {
        self.next_states().is_empty()
    }
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownState(pub String);

impl fmt::Display for UnknownState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown workflow state `{}`", self.0)
    }
}

impl std::error::Error for UnknownState {}

impl FromStr for WorkflowState {
    type Err = UnknownState;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WorkflowState::ALL
            .into_iter()
            .find(|state| state.as_str() == s)
            .ok_or_else(|| UnknownState(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completed_is_the_only_terminal_state() {
        let terminal: Vec<_> = WorkflowState::ALL
            .into_iter()
            .filter(|state| state.is_terminal())
            .collect();
        assert_eq!(terminal, vec![WorkflowState::Completed]);
    }

    #[test]
    fn names_round_trip_through_from_str() {
        for state in WorkflowState::ALL {
            assert_eq!(state.as_str().parse::<WorkflowState>(), Ok(state));
        }
        assert!("submitted".parse::<WorkflowState>().is_err());
    }

    #[test]
    fn serde_uses_screaming_snake_case() {
        let value = serde_json::to_value(WorkflowState::DocumentVerification).unwrap();
        assert_eq!(value, serde_json::json!("DOCUMENT_VERIFICATION"));
    }

    #[test]
    fn document_verification_reachable_from_two_states() {
        let sources: Vec<_> = WorkflowState::ALL
            .into_iter()
            .filter(|state| state.can_transition_to(WorkflowState::DocumentVerification))
            .collect();
        assert_eq!(
            sources,
            vec![
                WorkflowState::InitialValidation,
                WorkflowState::Communication
            ]
        );
    }
}
