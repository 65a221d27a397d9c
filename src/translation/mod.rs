mod step_count;
mod validator;

pub use step_count::estimate_step_count;
pub use validator::{TranslationOutcome, TranslationValidator};
