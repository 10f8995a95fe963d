mod attempt;
mod catalogue;
mod difficulty;
mod ids;
mod problem;
mod session;
mod settings;

pub use attempt::Attempt;
pub use catalogue::{AgeGroup, Domain, SkillKey, SubType};
pub use difficulty::Difficulty;
pub use ids::{LearnerId, ProblemId, SessionId};
pub use problem::{Answer, ComparisonRule, GeneratedProblem, Problem};
pub use session::{
    Session, SessionConfig, SessionProgress, SessionResult, SessionResultError,
};
pub use settings::EngineSettings;
