use rand::RngCore;
use thiserror::Error;

use crate::model::{AgeGroup, Difficulty, Domain, GeneratedProblem, SubType};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum GeneratorError {
    #[error("{domain} cannot generate {sub_type}")]
    UnsupportedSubType { domain: Domain, sub_type: SubType },

    #[error("generator produced an invalid problem: {0}")]
    Invalid(String),
}

/// Builds problems for one domain. The engine owns the randomness and passes it in.
pub trait ProblemGenerator: Send + Sync {
    fn domain(&self) -> Domain;

    /// Sub-types playable at `difficulty` for `age_group`, in catalogue order.
    fn sub_types(&self, difficulty: Difficulty, age_group: AgeGroup) -> Vec<SubType>;

    /// # Errors
    ///
    /// Returns `GeneratorError` when `sub_type` is not part of this domain.
    fn generate(
        &self,
        difficulty: Difficulty,
        sub_type: SubType,
        rng: &mut dyn RngCore,
    ) -> Result<GeneratedProblem, GeneratorError>;

    /// Advisory answer time. Never enforced.
    fn expected_answer_ms(&self, _sub_type: SubType, _difficulty: Difficulty) -> Option<u32> {
        None
    }
}

impl<G: ProblemGenerator + ?Sized> ProblemGenerator for Box<G> {
    fn domain(&self) -> Domain {
        (**self).domain()
    }

    fn sub_types(&self, difficulty: Difficulty, age_group: AgeGroup) -> Vec<SubType> {
        (**self).sub_types(difficulty, age_group)
    }

    fn generate(
        &self,
        difficulty: Difficulty,
        sub_type: SubType,
        rng: &mut dyn RngCore,
    ) -> Result<GeneratedProblem, GeneratorError> {
        (**self).generate(difficulty, sub_type, rng)
    }

    fn expected_answer_ms(&self, sub_type: SubType, difficulty: Difficulty) -> Option<u32> {
        (**self).expected_answer_ms(sub_type, difficulty)
    }
}
