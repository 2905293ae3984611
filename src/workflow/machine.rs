use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use super::state::WorkflowState;
use crate::error::LoanFlowError;
use crate::store::{LoanId, LoanStore};

/// 状态转换被拒绝的原因
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum TransitionRejection {
    NotFound { loan_id: LoanId },
    InvalidState { state: String },
    Illegal { from: WorkflowState, to: WorkflowState },
    /// 校验之后、写入之前状态已被其他调用改变
    Conflict {
        expected: WorkflowState,
        actual: WorkflowState,
    },
    PersistenceFailed { detail: String },
}

impl fmt::Display for TransitionRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransitionRejection::NotFound { .. } => f.write_str("Loan application not found"),
            TransitionRejection::InvalidState { state } => write!(f, "Invalid state: {state}"),
            TransitionRejection::Illegal { from, to } => {
                write!(f, "Cannot transition from {from} to {to}")
            }
            TransitionRejection::Conflict { expected, actual } => write!(
                f,
                "Loan application state changed from {expected} to {actual} during transition"
            ),
            TransitionRejection::PersistenceFailed { .. } => {
                f.write_str("Failed to update loan application state")
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TransitionOutcome {
    Applied {
        from: WorkflowState,
        to: WorkflowState,
    },
    Rejected(TransitionRejection),
}

impl TransitionOutcome {
    pub fn success(&self) -> bool {
        matches!(self, TransitionOutcome::Applied { .. })
    }

    pub fn message(&self) -> String {
        match self {
            TransitionOutcome::Applied { from, to } => {
                format!("Successfully transitioned from {from} to {to}")
            }
            TransitionOutcome::Rejected(rejection) => rejection.to_string(),
        }
    }

    pub fn rejection(&self) -> Option<&TransitionRejection> {
        match self {
            TransitionOutcome::Rejected(rejection) => Some(rejection),
            TransitionOutcome::Applied { .. } => None,
        }
    }
}

/// 贷款工作流状态机
///
/// 只负责校验转换并委托存储写入；当前状态与历史由存储持有。
#[derive(Clone)]
pub struct LoanStateMachine {
    store: Arc<dyn LoanStore>,
}

impl LoanStateMachine {
    pub fn new(store: Arc<dyn LoanStore>) -> Self {
        Self { store }
    }

    /// 未知状态或终止状态返回空集合
    pub fn possible_transitions(&self, state: &str) -> Vec<WorkflowState> {
        state
            .parse::<WorkflowState>()
            .map(|state| state.next_states().to_vec())
            .unwrap_or_default()
    }

    pub async fn current_state(&self, loan_id: LoanId) -> Option<WorkflowState> {
        match self.store.get_loan_application(loan_id).await {
            Ok(loan) => loan.map(|loan| loan.current_state),
            Err(err) => {
                warn!(loan_id, %err, "Failed to read loan application");
                None
            }
        }
    }

    pub async fn transition(&self, loan_id: LoanId, target: &str) -> TransitionOutcome {
        let current = match self.store.get_loan_application(loan_id).await {
            Ok(Some(loan)) => loan.current_state,
            Ok(None) => return TransitionOutcome::Rejected(TransitionRejection::NotFound { loan_id }),
            Err(err) => {
                warn!(loan_id, %err, "Failed to read loan application");
                return TransitionOutcome::Rejected(TransitionRejection::PersistenceFailed {
                    detail: err.to_string(),
                });
            }
        };

        let target = match target.parse::<WorkflowState>() {
            Ok(state) => state,
            Err(err) => {
                return TransitionOutcome::Rejected(TransitionRejection::InvalidState {
                    state: err.0,
                })
            }
        };

        if !current.can_transition_to(target) {
            info!(loan_id, from = %current, to = %target, "Rejected illegal transition");
            return TransitionOutcome::Rejected(TransitionRejection::Illegal {
                from: current,
                to: target,
            });
        }

        // 写入时再次比较当前状态，并发转换只有一个能生效
        match self.store.record_state(loan_id, current, target).await {
            Ok(_) => {
                info!(loan_id, from = %current, to = %target, "Loan state updated");
                TransitionOutcome::Applied {
                    from: current,
                    to: target,
                }
            }
            Err(LoanFlowError::StateConflict { actual, .. }) => {
                info!(loan_id, expected = %current, %actual, to = %target, "Transition lost a race");
                TransitionOutcome::Rejected(TransitionRejection::Conflict {
                    expected: current,
                    actual,
                })
            }
            Err(err) => {
                warn!(loan_id, %err, to = %target, "Failed to record loan state");
                TransitionOutcome::Rejected(TransitionRejection::PersistenceFailed {
                    detail: err.to_string(),
                })
            }
        }
    }

    pub async fn transition_to(&self, loan_id: LoanId, target: WorkflowState) -> TransitionOutcome {
        self.transition(loan_id, target.as_str()).await
    }
}
