//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::error::ConfigError;
use quiz_core::generator::GeneratorError;
use quiz_core::model::{ProblemId, SessionResultError};
use quiz_core::selector::SelectionError;

/// Errors emitted by `AdaptiveSessionEngine`.
///
/// A wrong answer is never an error; it is reported through `Outcome`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("problem {0} is not pending")]
    UnknownProblem(ProblemId),

    #[error(transparent)]
    Selection(#[from] SelectionError),

    #[error(transparent)]
    Generator(#[from] GeneratorError),

    #[error(transparent)]
    Result(#[from] SessionResultError),

    #[error("no session has been started")]
    NotStarted,

    #[error("session not complete: {asked} of {max} questions answered")]
    NotComplete { asked: u32, max: u32 },
}
