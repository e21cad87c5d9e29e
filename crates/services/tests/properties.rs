use std::collections::HashSet;

use proptest::prelude::*;
use quiz_core::model::{Question, QuestionId};
use rand::SeedableRng;
use rand::rngs::StdRng;
use services::{Advance, QuizPlanner, QuizSession, Selection};

fn questions(n: usize) -> Vec<Question> {
    (0..n)
        .map(|i| {
            Question::new(
                QuestionId::new(format!("q{i}")),
                format!("Question {i}"),
                vec!["a".into(), "b".into(), "c".into(), "d".into()],
                i % 4,
                None,
            )
            .unwrap()
        })
        .collect()
}

proptest! {
    #[test]
    fn plan_length_is_clamped_and_unique(
        total in 1usize..60,
        requested in 0usize..120,
        seed in any::<u64>(),
    ) {
        let bank = questions(total);
        let planner = QuizPlanner::new(&bank);
        let plan = planner.build_with_rng(requested, &mut StdRng::seed_from_u64(seed));

        let expected = requested.clamp(total.min(10), total);
        prop_assert_eq!(plan.total(), expected);

        let ids: HashSet<_> = plan.questions.iter().map(|q| q.id().clone()).collect();
        prop_assert_eq!(ids.len(), expected);
    }

    #[test]
    fn only_first_selection_scores(first in 0usize..4, second in 0usize..4) {
        let mut session = QuizSession::new(questions(3)).unwrap();
        session.select_answer(first).unwrap();
        let after_first = session.score();

        let outcome = session.select_answer(second).unwrap();
        prop_assert_eq!(outcome, Selection::AlreadyAnswered { selected: first });
        prop_assert_eq!(session.score(), after_first);
        prop_assert!(session.score() <= 1);
    }

    #[test]
    fn score_counts_correct_answers_among_advanced(
        answers in proptest::collection::vec(0usize..4, 1..25),
    ) {
        let bank = questions(answers.len());
        let mut session = QuizSession::new(bank.clone()).unwrap();

        let mut expected = 0u32;
        for (n, &answer) in answers.iter().enumerate() {
            session.select_answer(answer).unwrap();
            if bank[n].is_correct(answer) {
                expected += 1;
            }
            let step = session.advance().unwrap();
            prop_assert_eq!(session.score(), expected);
            prop_assert!(session.score() as usize <= session.current_index());
            let last = n + 1 == answers.len();
            prop_assert_eq!(step == Advance::Finished, last);
        }
        prop_assert!(session.is_complete());
    }

    #[test]
    fn restore_matches_saved_progress(
        answers in proptest::collection::vec(0usize..4, 1..15),
        stop_at in 0usize..15,
    ) {
        let bank = questions(answers.len());
        let mut session = QuizSession::new(bank.clone()).unwrap();
        for &answer in answers.iter().take(stop_at.min(answers.len() - 1)) {
            session.select_answer(answer).unwrap();
            session.advance().unwrap();
        }

        let saved = session.to_saved_progress();
        let restored = QuizSession::restore(
            bank,
            saved.current_index,
            saved.score,
            saved.selected_index,
        )
        .unwrap();
        prop_assert_eq!(restored, session);
    }
}
