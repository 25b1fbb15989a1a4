//! Error types for the form controller.

use thiserror::Error;

/// Errors surfaced by form operations.
///
/// Validation failures are not errors: they live in the summary. This type
/// covers submission, configuration and logging setup.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum FormError {
    /// `submit()` was called but the form has no action configured.
    #[error("No submit action configured")]
    MissingAction,

    /// The submit action returned an error.
    #[error(transparent)]
    Action(#[from] anyhow::Error),

    /// Configuration text could not be parsed.
    #[error("Invalid form configuration: {0}")]
    Config(#[from] toml::de::Error),

    /// A global tracing subscriber was already installed.
    #[error("Logging already initialized: {0}")]
    Logging(#[from] tracing_subscriber::util::TryInitError),
}

/// Result type alias for form operations.
pub type Result<T> = std::result::Result<T, FormError>;

impl FormError {
    /// Check if this error is recoverable (user can fix and retry).
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Action(_))
    }

    /// Get a user-friendly suggestion for fixing this error.
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::MissingAction => {
                Some("Pass an action to FormOptions::action or call submit_with instead.")
            }
            Self::Action(_) => Some("Check the submission target and try again."),
            Self::Config(_) => Some("Check the [submit] and [logging] sections of the form config."),
            Self::Logging(_) => Some("Initialize logging once at startup."),
        }
    }
}
