// 运行时：把注册表、消息交换与状态机装配成处理流水线

mod pipeline;

pub use pipeline::{
    LoanPipeline, LoanStatus, ProcessingReport, SubmissionReport, VerificationStep,
    VERIFICATION_CAPABILITY,
};
