mod condenser;
mod validator;

pub use condenser::StepCondenser;
pub use validator::{clean_step, StepValidator};
