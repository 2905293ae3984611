mod intake;
mod verification;

pub use intake::ApplicationIntakeAgent;
pub use verification::DocumentVerificationAgent;
