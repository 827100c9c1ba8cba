//! Workflow state machine for one upload → process → display run.
//!
//! `transition` is pure: it maps `(state, event)` to the next state plus the
//! effects the App has to carry out (section visibility, the request, the
//! alert).  Nothing here touches the terminal or the network.
//!
//! ```text
//!  Idle ──FileSelected──▶ Uploading ──UploadSucceeded──▶ ResultsShown
//!   ▲                        │
//!   │                  UploadFailed
//!   │                        ▼
//!   └───AlertDismissed─── Erroring
//! ```

use std::time::Duration;

use sheetdrop_proto::client::{SelectedFile, TransferError};
use sheetdrop_proto::protocol::ProcessResult;

/// What the user is told when a run fails, whatever the cause.
pub const GENERIC_FAILURE_MESSAGE: &str = "An error occurred during processing. Please try again.";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum WorkflowState {
    #[default]
    Idle,
    /// A request is in flight for the named file.
    Uploading { file_name: String },
    /// The failure alert is up; dismissing it returns to `Idle`.
    Erroring,
    /// Terminal for this session.
    ResultsShown,
}

impl WorkflowState {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "READY",
            Self::Uploading { .. } => "UPLOADING",
            Self::Erroring => "ERROR",
            Self::ResultsShown => "RESULTS",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Upload,
    Processing,
    Results,
}

#[derive(Debug, Clone)]
pub enum WorkflowEvent {
    FileSelected(SelectedFile),
    UploadSucceeded(ProcessResult),
    UploadFailed(TransferError),
    AlertDismissed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Show(Section),
    Hide(Section),
    /// Hide after an exit transition of the given length.
    HideAfter(Section, Duration),
    /// Start the upload request for this file.
    Dispatch(SelectedFile),
    /// Hand the payload to the result renderer.
    Render(ProcessResult),
    /// Record the technical cause of a failure in the log.
    LogFailure(TransferError),
    /// Blocking notification; stays until dismissed.
    Alert(String),
    /// The event was not acted on.
    Ignored(String),
}

/// Next state and the effects to run for `event` in `state`.
pub fn transition(
    state: &WorkflowState,
    event: WorkflowEvent,
    exit_transition: Duration,
) -> (WorkflowState, Vec<Effect>) {
    use WorkflowEvent as Ev;
    use WorkflowState as St;

    match (state, event) {
        (St::Idle, Ev::FileSelected(file)) => {
            let hide_upload = if exit_transition.is_zero() {
                Effect::Hide(Section::Upload)
            } else {
                Effect::HideAfter(Section::Upload, exit_transition)
            };
            (
                St::Uploading {
                    file_name: file.name.clone(),
                },
                vec![
                    hide_upload,
                    Effect::Show(Section::Processing),
                    Effect::Hide(Section::Results),
                    Effect::Dispatch(file),
                ],
            )
        }
        (St::Uploading { .. }, Ev::FileSelected(file)) => (
            state.clone(),
            vec![Effect::Ignored(format!(
                "upload already in progress; {} was not submitted",
                file.name
            ))],
        ),
        (St::Erroring, Ev::FileSelected(_)) => (
            state.clone(),
            vec![Effect::Ignored("dismiss the error first".to_string())],
        ),
        (St::ResultsShown, Ev::FileSelected(_)) => (
            state.clone(),
            vec![Effect::Ignored(
                "this session already has results; restart to process another file".to_string(),
            )],
        ),

        (St::Uploading { .. }, Ev::UploadSucceeded(result)) => (
            St::ResultsShown,
            vec![
                Effect::Hide(Section::Processing),
                Effect::Show(Section::Results),
                Effect::Render(result),
            ],
        ),
        (St::Uploading { .. }, Ev::UploadFailed(err)) => (
            St::Erroring,
            vec![
                Effect::LogFailure(err),
                Effect::Alert(GENERIC_FAILURE_MESSAGE.to_string()),
            ],
        ),
        (_, Ev::UploadSucceeded(_)) | (_, Ev::UploadFailed(_)) => (
            state.clone(),
            vec![Effect::Ignored(format!(
                "upload outcome arrived while {}",
                state.label()
            ))],
        ),

        (St::Erroring, Ev::AlertDismissed) => (
            St::Idle,
            vec![
                Effect::Show(Section::Upload),
                Effect::Hide(Section::Processing),
                Effect::Hide(Section::Results),
            ],
        ),
        (_, Ev::AlertDismissed) => (state.clone(), Vec::new()),
    }
}

/// The single workflow instance, owned by the App.
#[derive(Debug)]
pub struct Workflow {
    state: WorkflowState,
    exit_transition: Duration,
}

impl Workflow {
    pub fn new(exit_transition: Duration) -> Self {
        Self {
            state: WorkflowState::Idle,
            exit_transition,
        }
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    pub fn apply(&mut self, event: WorkflowEvent) -> Vec<Effect> {
        let (next, effects) = transition(&self.state, event, self.exit_transition);
        if next != self.state {
            tracing::debug!("workflow {} -> {}", self.state.label(), next.label());
        }
        self.state = next;
        effects
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sheetdrop_proto::protocol::StatEntry;

    const EXIT: Duration = Duration::from_millis(300);

    fn file(name: &str) -> SelectedFile {
        SelectedFile::from_path(format!("/data/{}", name))
    }

    fn result() -> ProcessResult {
        ProcessResult {
            uid: "abc123".to_string(),
            stats: vec![StatEntry::new("Total", 0), StatEntry::new("Final", 1500)],
        }
    }

    fn dispatches(effects: &[Effect]) -> usize {
        effects
            .iter()
            .filter(|e| matches!(e, Effect::Dispatch(_)))
            .count()
    }

    #[test]
    fn test_selection_shows_processing_and_dispatches_once() {
        let (next, effects) = transition(
            &WorkflowState::Idle,
            WorkflowEvent::FileSelected(file("a.xlsx")),
            EXIT,
        );
        assert_eq!(
            next,
            WorkflowState::Uploading {
                file_name: "a.xlsx".to_string()
            }
        );
        assert_eq!(
            effects,
            vec![
                Effect::HideAfter(Section::Upload, EXIT),
                Effect::Show(Section::Processing),
                Effect::Hide(Section::Results),
                Effect::Dispatch(file("a.xlsx")),
            ]
        );
    }

    #[test]
    fn test_zero_exit_transition_hides_immediately() {
        let (_, effects) = transition(
            &WorkflowState::Idle,
            WorkflowEvent::FileSelected(file("a.xlsx")),
            Duration::ZERO,
        );
        assert_eq!(effects[0], Effect::Hide(Section::Upload));
    }

    #[test]
    fn test_second_selection_while_uploading_is_ignored() {
        let mut wf = Workflow::new(EXIT);
        assert_eq!(dispatches(&wf.apply(WorkflowEvent::FileSelected(file("a.xlsx")))), 1);
        let effects = wf.apply(WorkflowEvent::FileSelected(file("b.xlsx")));
        assert_eq!(dispatches(&effects), 0);
        assert!(matches!(effects.as_slice(), [Effect::Ignored(_)]));
        assert_eq!(
            wf.state(),
            &WorkflowState::Uploading {
                file_name: "a.xlsx".to_string()
            }
        );
    }

    #[test]
    fn test_success_renders_results() {
        let mut wf = Workflow::new(EXIT);
        wf.apply(WorkflowEvent::FileSelected(file("a.xlsx")));
        let effects = wf.apply(WorkflowEvent::UploadSucceeded(result()));
        assert_eq!(wf.state(), &WorkflowState::ResultsShown);
        assert_eq!(
            effects,
            vec![
                Effect::Hide(Section::Processing),
                Effect::Show(Section::Results),
                Effect::Render(result()),
            ]
        );
    }

    #[test]
    fn test_every_failure_kind_alerts_then_reverts_to_idle() {
        let failures = [
            TransferError::TransportFailure("connection refused".to_string()),
            TransferError::ServerRejected { status: 500 },
            TransferError::MalformedResponse("missing field `stats`".to_string()),
        ];
        for err in failures {
            let mut wf = Workflow::new(EXIT);
            wf.apply(WorkflowEvent::FileSelected(file("a.xlsx")));
            let effects = wf.apply(WorkflowEvent::UploadFailed(err.clone()));
            assert_eq!(wf.state(), &WorkflowState::Erroring);
            assert_eq!(
                effects,
                vec![
                    Effect::LogFailure(err),
                    Effect::Alert(GENERIC_FAILURE_MESSAGE.to_string()),
                ]
            );
            assert!(!effects.iter().any(|e| matches!(e, Effect::Render(_))));

            let effects = wf.apply(WorkflowEvent::AlertDismissed);
            assert_eq!(wf.state(), &WorkflowState::Idle);
            assert_eq!(
                effects,
                vec![
                    Effect::Show(Section::Upload),
                    Effect::Hide(Section::Processing),
                    Effect::Hide(Section::Results),
                ]
            );
        }
    }

    #[test]
    fn test_retry_after_failure_dispatches_again() {
        let mut wf = Workflow::new(EXIT);
        wf.apply(WorkflowEvent::FileSelected(file("a.xlsx")));
        wf.apply(WorkflowEvent::UploadFailed(TransferError::ServerRejected {
            status: 502,
        }));
        assert_eq!(dispatches(&wf.apply(WorkflowEvent::FileSelected(file("a.xlsx")))), 0);
        wf.apply(WorkflowEvent::AlertDismissed);
        assert_eq!(dispatches(&wf.apply(WorkflowEvent::FileSelected(file("a.xlsx")))), 1);
    }

    #[test]
    fn test_results_shown_is_terminal() {
        let mut wf = Workflow::new(EXIT);
        wf.apply(WorkflowEvent::FileSelected(file("a.xlsx")));
        wf.apply(WorkflowEvent::UploadSucceeded(result()));
        let effects = wf.apply(WorkflowEvent::FileSelected(file("b.xlsx")));
        assert_eq!(dispatches(&effects), 0);
        assert_eq!(wf.state(), &WorkflowState::ResultsShown);
        assert!(wf.apply(WorkflowEvent::AlertDismissed).is_empty());
    }

    #[test]
    fn test_stray_outcome_in_idle_changes_nothing() {
        let (next, effects) = transition(
            &WorkflowState::Idle,
            WorkflowEvent::UploadSucceeded(result()),
            EXIT,
        );
        assert_eq!(next, WorkflowState::Idle);
        assert!(matches!(effects.as_slice(), [Effect::Ignored(_)]));
    }
}
