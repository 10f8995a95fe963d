use crate::ladder::DifficultyLadder;
use crate::mastery::PromotionPolicy;
use crate::model::AgeGroup;

/// Engine-wide configuration. Checked against the generator when an engine is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    ladder: DifficultyLadder,
    promotion: PromotionPolicy,
    age_group: AgeGroup,
}

impl EngineSettings {
    #[must_use]
    pub fn new(ladder: DifficultyLadder, promotion: PromotionPolicy, age_group: AgeGroup) -> Self {
        Self {
            ladder,
            promotion,
            age_group,
        }
    }

    #[must_use]
    pub fn with_ladder(mut self, ladder: DifficultyLadder) -> Self {
        self.ladder = ladder;
        self
    }

    #[must_use]
    pub fn with_promotion(mut self, promotion: PromotionPolicy) -> Self {
        self.promotion = promotion;
        self
    }

    #[must_use]
    pub fn with_age_group(mut self, age_group: AgeGroup) -> Self {
        self.age_group = age_group;
        self
    }

    #[must_use]
    pub fn ladder(&self) -> &DifficultyLadder {
        &self.ladder
    }

    #[must_use]
    pub fn promotion(&self) -> PromotionPolicy {
        self.promotion
    }

    #[must_use]
    pub fn age_group(&self) -> AgeGroup {
        self.age_group
    }
}

impl Default for EngineSettings {
    /// Full five-level ladder, observed promotion behaviour, kindergarten learners.
    fn default() -> Self {
        Self {
            ladder: DifficultyLadder::full(),
            promotion: PromotionPolicy::default(),
            age_group: AgeGroup::default(),
        }
    }
}
