//! Domain model module declarations.

pub mod action;
pub mod outcome;
pub mod session;

pub use action::Action;
pub use outcome::{StepResult, WorkflowOutcome};
pub use session::{Session, SessionSnapshot};
