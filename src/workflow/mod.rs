// 工作流状态机模块

mod machine;
mod state;

pub use machine::{LoanStateMachine, TransitionOutcome, TransitionRejection};
pub use state::{UnknownState, WorkflowState};
