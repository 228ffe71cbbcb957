use std::fmt;
use std::sync::Mutex;

/// A sub-step of one migration task.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Step {
    CreateRepository { repository: String },
    DownloadSnapshot { branch: String },
    Upload { repository: String },
}

impl Step {
    fn number(&self) -> u8 {
        match self {
            Step::CreateRepository { .. } => 1,
            Step::DownloadSnapshot { .. } => 2,
            Step::Upload { .. } => 3,
        }
    }
}

/// Progress of a migration run, in the order it happens.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    RunStarted {
        source: String,
        tasks: usize,
    },
    TaskStarted {
        branch: String,
        destination: String,
    },
    StepStarted(Step),
    StepFinished {
        step: Step,
        detail: Option<String>,
    },
    TaskSucceeded {
        branch: String,
        url: String,
    },
    TaskFailed {
        branch: String,
        reason: String,
    },
    RunFinished {
        succeeded: usize,
        failed: usize,
    },
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::RunStarted { source, tasks } => {
                write!(f, "Migration start: {} -> {} new repositories", source, tasks)
            }
            Event::TaskStarted {
                branch,
                destination,
            } => write!(
                f,
                "-------------------------------------------------\nProcessing branch '{}'\nTarget repo: '{}'",
                branch, destination
            ),
            Event::StepStarted(step) => match step {
                Step::CreateRepository { repository } => {
                    write!(f, "   {}. Creating repository '{}'...", step.number(), repository)
                }
                Step::DownloadSnapshot { branch } => write!(
                    f,
                    "   {}. Downloading source files from branch '{}'...",
                    step.number(),
                    branch
                ),
                Step::Upload { repository } => write!(
                    f,
                    "   {}. Uploading to '{}' (main branch)...",
                    step.number(),
                    repository
                ),
            },
            Event::StepFinished { step, detail } => match detail {
                Some(detail) => write!(f, "      step {} done: {}", step.number(), detail),
                None => write!(f, "      step {} done", step.number()),
            },
            Event::TaskSucceeded { url, .. } => write!(f, "Success! Check: {}", url),
            Event::TaskFailed { branch, reason } => {
                write!(f, "Failed to migrate {}: {}", branch, reason)
            }
            Event::RunFinished { succeeded, failed } => write!(
                f,
                "\nAll migration tasks completed ({} succeeded, {} failed).",
                succeeded, failed
            ),
        }
    }
}

/// Receives the human readable progress of a run.
pub trait Reporter {
    fn report(&self, event: Event);
}

/// Prints every event to stdout.
#[derive(Clone, Copy, Debug, Default)]
pub struct ConsoleReporter;

impl Reporter for ConsoleReporter {
    fn report(&self, event: Event) {
        println!("{}", event);
    }
}

/// Keeps events in memory.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    events: Mutex<Vec<Event>>,
}

impl RecordingReporter {
    pub fn events(&self) -> Vec<Event> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl Reporter for RecordingReporter {
    fn report(&self, event: Event) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

impl<R: Reporter + ?Sized> Reporter for &R {
    fn report(&self, event: Event) {
        (**self).report(event)
    }
}
