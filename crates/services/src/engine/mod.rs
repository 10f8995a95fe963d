mod controller;
mod events;

// Public API of the session engine.
pub use crate::error::EngineError;
pub use controller::{AdaptiveSessionEngine, NextStep, Outcome, SessionState};
pub use events::{EventCallback, EventHub, SessionEvent};
