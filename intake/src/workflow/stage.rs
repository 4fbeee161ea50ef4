//! Workflow stages and the transition table.

use std::fmt;

use crate::error::WorkflowError;

/// Where the document is in the intake process.
///
/// Failures are not stages: a failed extraction stays in `Preview` and a
/// failed save returns to `Review`, each with an error notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WorkflowStage {
    /// Waiting for a file.
    #[default]
    Upload,
    /// A document is loaded and can be extracted.
    Preview,
    /// Fields are shown for operator correction.
    Review,
    /// A save request is outstanding.
    Submitting,
    /// The record was stored.
    Saved,
}

impl WorkflowStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowStage::Upload => "Upload",
            WorkflowStage::Preview => "Preview",
            WorkflowStage::Review => "Review",
            WorkflowStage::Submitting => "Submitting",
            WorkflowStage::Saved => "Saved",
        }
    }
}

impl fmt::Display for WorkflowStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Something that moves the workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// A file passed validation.
    Accept,
    /// Extraction request dispatched.
    Extract,
    /// Extraction result applied.
    Extracted,
    /// Extraction failed; stay for retry.
    ExtractionFailed,
    /// Operator opens the form without extraction.
    EnterReview,
    /// Operator changes a field.
    Edit,
    /// Save request dispatched.
    Submit,
    /// Store acknowledged the save.
    Saved,
    /// Save failed; back to the form.
    SaveFailed,
    /// Back to the start.
    Reset,
}

impl Transition {
    fn operation(&self) -> &'static str {
        match self {
            Transition::Accept => "accept a file",
            Transition::Extract => "extract",
            Transition::Extracted | Transition::ExtractionFailed => "complete an extraction",
            Transition::EnterReview => "open the review form",
            Transition::Edit => "edit",
            Transition::Submit => "submit",
            Transition::Saved | Transition::SaveFailed => "complete a save",
            Transition::Reset => "reset",
        }
    }
}

/// Next stage for `transition` taken from `stage`.
///
/// Document presence is checked by the caller; this table only knows about
/// stages.
pub fn next_stage(stage: WorkflowStage, transition: Transition) -> Result<WorkflowStage, WorkflowError> {
    use Transition as T;
    use WorkflowStage as S;

    let next = match (stage, transition) {
        (_, T::Accept) => S::Preview,
        (_, T::Reset) => S::Upload,

        (S::Preview, T::Extract) => S::Preview,
        (S::Preview, T::Extracted) => S::Review,
        (S::Preview, T::ExtractionFailed) => S::Preview,
        (S::Preview, T::EnterReview) => S::Review,

        (S::Review, T::Edit) => S::Review,
        (S::Review, T::Submit) => S::Submitting,

        (S::Submitting, T::Saved) => S::Saved,
        (S::Submitting, T::SaveFailed) => S::Review,

        (stage, transition) => {
            return Err(WorkflowError::InvalidStage {
                operation: transition.operation(),
                stage,
            })
        }
    };

    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path() {
        let mut stage = WorkflowStage::default();
        for (transition, expected) in [
            (Transition::Accept, WorkflowStage::Preview),
            (Transition::Extract, WorkflowStage::Preview),
            (Transition::Extracted, WorkflowStage::Review),
            (Transition::Edit, WorkflowStage::Review),
            (Transition::Submit, WorkflowStage::Submitting),
            (Transition::Saved, WorkflowStage::Saved),
            (Transition::Reset, WorkflowStage::Upload),
        ] {
            stage = next_stage(stage, transition).unwrap();
            assert_eq!(stage, expected, "after {transition:?}");
        }
    }

    #[test]
    fn test_failures_allow_retry() {
        assert_eq!(
            next_stage(WorkflowStage::Preview, Transition::ExtractionFailed).unwrap(),
            WorkflowStage::Preview
        );
        assert_eq!(
            next_stage(WorkflowStage::Submitting, Transition::SaveFailed).unwrap(),
            WorkflowStage::Review
        );
    }

    #[test]
    fn test_accept_and_reset_from_anywhere() {
        for stage in [
            WorkflowStage::Upload,
            WorkflowStage::Preview,
            WorkflowStage::Review,
            WorkflowStage::Submitting,
            WorkflowStage::Saved,
        ] {
            assert_eq!(next_stage(stage, Transition::Accept).unwrap(), WorkflowStage::Preview);
            assert_eq!(next_stage(stage, Transition::Reset).unwrap(), WorkflowStage::Upload);
        }
    }

    #[test]
    fn test_illegal_transitions() {
        for (stage, transition) in [
            (WorkflowStage::Upload, Transition::Extract),
            (WorkflowStage::Upload, Transition::Submit),
            (WorkflowStage::Preview, Transition::Submit),
            (WorkflowStage::Preview, Transition::Edit),
            (WorkflowStage::Review, Transition::Extract),
            (WorkflowStage::Submitting, Transition::Edit),
            (WorkflowStage::Submitting, Transition::Submit),
            (WorkflowStage::Saved, Transition::Edit),
            (WorkflowStage::Saved, Transition::Submit),
        ] {
            assert!(
                matches!(next_stage(stage, transition), Err(WorkflowError::InvalidStage { .. })),
                "{transition:?} from {stage}"
            );
        }
    }
}
