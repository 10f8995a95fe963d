use std::fmt;

use quiz_core::model::{Difficulty, Domain, ProblemId, SessionId, SkillKey, SubType};

/// Lifecycle notifications delivered to callbacks registered on an engine.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionEvent {
    Started {
        session_id: SessionId,
        domain: Domain,
        difficulty: Difficulty,
        max_questions: u32,
    },
    ProblemIssued {
        problem_id: ProblemId,
        sub_type: SubType,
        difficulty: Difficulty,
    },
    AnswerEvaluated {
        problem_id: ProblemId,
        correct: bool,
        streak: u32,
    },
    DifficultyChanged {
        from: Difficulty,
        to: Difficulty,
    },
    SkillPromoted {
        skill_key: SkillKey,
        level: u8,
    },
    Completed {
        session_id: SessionId,
        questions_asked: u32,
        correct_count: u32,
    },
}

pub type EventCallback = Box<dyn Fn(&SessionEvent) + Send + Sync>;

/// Callbacks owned by one engine. Delivery is synchronous and in registration order.
#[derive(Default)]
pub struct EventHub {
    listeners: Vec<EventCallback>,
}

impl EventHub {
    pub fn subscribe(&mut self, callback: EventCallback) {
        self.listeners.push(callback);
    }

    pub fn emit(&self, event: &SessionEvent) {
        for listener in &self.listeners {
            listener(event);
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl fmt::Debug for EventHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventHub")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
