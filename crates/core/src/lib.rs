#![forbid(unsafe_code)]

pub mod domains;
pub mod error;
pub mod feedback;
pub mod generator;
pub mod ladder;
pub mod mastery;
pub mod model;
pub mod selector;
pub mod time;

pub use error::{ConfigError, ParseKeyError};
pub use time::Clock;
