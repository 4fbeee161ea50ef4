//! Intake workflow.
//!
//! - [`stage`] - stages and the transition table
//! - [`context`] - the [`Workflow`] state: document, record, pending requests, notice
//! - [`extraction`] - running an extraction request
//! - [`submission`] - running a save request
//! - [`session`] - async driver applying completions as they arrive

pub mod context;
pub mod extraction;
pub mod session;
pub mod stage;
pub mod submission;

pub use context::{
    Completion, Dispatch, Notice, NoticeLevel, RequestTag, Workflow, EXTRACTION_FAILED_MESSAGE,
    SAVED_MESSAGE, SAVE_FAILED_MESSAGE,
};
pub use extraction::{ExtractionOutcome, ExtractionTicket};
pub use session::Session;
pub use stage::{next_stage, Transition, WorkflowStage};
pub use submission::{SaveOutcome, SaveTicket};
