use rand::Rng;
use rand::seq::SliceRandom;

use quiz_core::model::Question;

/// Quizzes never go shorter than this unless the bank itself is smaller.
pub const MIN_QUIZ_LENGTH: usize = 10;

/// Selection result for a quiz build.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizPlan {
    pub questions: Vec<Question>,
    pub requested: usize,
    pub available: usize,
}

impl QuizPlan {
    /// Total number of questions in this plan.
    #[must_use]
    pub fn total(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

/// Builds a quiz by shuffling the whole bank and keeping a prefix.
pub struct QuizPlanner<'a> {
    questions: &'a [Question],
}

impl<'a> QuizPlanner<'a> {
    #[must_use]
    pub fn new(questions: &'a [Question]) -> Self {
        Self { questions }
    }

    /// Allowed `(min, max)` quiz lengths for the bank.
    #[must_use]
    pub fn bounds(&self) -> (usize, usize) {
        let total = self.questions.len();
        (total.min(MIN_QUIZ_LENGTH), total)
    }

    /// Clamp a requested length into `bounds()`.
    #[must_use]
    pub fn session_length(&self, requested: usize) -> usize {
        let (min, max) = self.bounds();
        requested.clamp(min, max)
    }

    /// Build a plan using the thread-local RNG.
    #[must_use]
    pub fn build(&self, requested: usize) -> QuizPlan {
        self.build_with_rng(requested, &mut rand::rng())
    }

    /// Build a plan from a random permutation drawn from `rng`.
    pub fn build_with_rng<R: Rng + ?Sized>(&self, requested: usize, rng: &mut R) -> QuizPlan {
        let length = self.session_length(requested);
        let mut shuffled = self.questions.to_vec();
        shuffled.as_mut_slice().shuffle(rng);
        shuffled.truncate(length);

        QuizPlan {
            questions: shuffled,
            requested,
            available: self.questions.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::QuestionId;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;

    fn bank(n: usize) -> Vec<Question> {
        (0..n)
            .map(|i| {
                Question::new(
                    QuestionId::new(format!("q{i}")),
                    format!("Question {i}"),
                    vec!["a".into(), "b".into()],
                    i % 2,
                    None,
                )
                .unwrap()
            })
            .collect()
    }

    #[test]
    fn length_is_clamped_between_floor_and_total() {
        let questions = bank(25);
        let planner = QuizPlanner::new(&questions);
        assert_eq!(planner.bounds(), (10, 25));
        assert_eq!(planner.session_length(0), 10);
        assert_eq!(planner.session_length(3), 10);
        assert_eq!(planner.session_length(17), 17);
        assert_eq!(planner.session_length(99), 25);
    }

    #[test]
    fn small_bank_uses_everything() {
        let questions = bank(3);
        let planner = QuizPlanner::new(&questions);
        assert_eq!(planner.bounds(), (3, 3));
        assert_eq!(planner.build(1).total(), 3);
    }

    #[test]
    fn empty_bank_builds_empty_plan() {
        let plan = QuizPlanner::new(&[]).build(5);
        assert!(plan.is_empty());
        assert_eq!(plan.available, 0);
    }

    #[test]
    fn plan_has_no_duplicates() {
        let questions = bank(30);
        let plan = QuizPlanner::new(&questions).build(20);
        let ids: HashSet<_> = plan.questions.iter().map(|q| q.id().clone()).collect();
        assert_eq!(ids.len(), 20);
        assert_eq!(plan.requested, 20);
    }

    #[test]
    fn seeded_rng_is_deterministic() {
        let questions = bank(15);
        let planner = QuizPlanner::new(&questions);
        let a = planner.build_with_rng(12, &mut StdRng::seed_from_u64(7));
        let b = planner.build_with_rng(12, &mut StdRng::seed_from_u64(7));
        assert_eq!(a, b);
    }
}
