use thiserror::Error;

/// Failure classes that abort processing. The non-fatal "page not found"
/// condition is not an error; it is reported as [`Outcome::NotFound`].
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("repository name is not provided")]
    MissingRepository,

    #[error("invalid repository name: {0:?}")]
    InvalidRepoName(String),

    #[error("event payload is missing required field: {0}")]
    MissingPayloadField(&'static str),

    #[error("issue state is not defined for issue #{number}")]
    MissingIssueState { number: i64 },

    #[error("issue number not found in pull request url: {url:?}")]
    InvalidIssueRef { url: String },

    #[error(transparent)]
    Remote(#[from] anyhow::Error),
}

/// Terminal state of a single-event reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The mutation was applied.
    Applied,
    /// The expected page was absent; logged, no mutation performed.
    NotFound,
    /// The event carried no action for this system.
    Skipped,
}
