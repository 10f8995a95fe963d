#![forbid(unsafe_code)]

pub mod engine;
pub mod error;
pub mod learner;

pub use quiz_core::Clock;

pub use engine::{AdaptiveSessionEngine, NextStep, Outcome, SessionEvent, SessionState};
pub use error::EngineError;
pub use learner::{FinishedSession, LearnerService};
