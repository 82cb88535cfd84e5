use rand::{seq::SliceRandom, Rng};
use serde::Serialize;
use uuid::Uuid;

use super::bank::{ChoiceKey, Question, QuestionBank};

pub const DEFAULT_QUIZ_LENGTH: usize = 10;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRecord {
    pub question_index: usize,
    pub answer: ChoiceKey,
    pub correct: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizState {
    pub attempt_id: Option<Uuid>,
    pub questions: Vec<Question>,
    /// Position of each drawn question in the bank
    pub bank_indices: Vec<usize>,
    pub current: usize,
    pub score: u32,
    pub started: bool,
    pub finished: bool,
    pub answers: Vec<AnswerRecord>,
}

impl Default for QuizState {
    fn default() -> Self {
        Self {
            attempt_id: None,
            questions: Vec::new(),
            bank_indices: Vec::new(),
            current: 0,
            score: 0,
            started: false,
            finished: false,
            answers: Vec::new(),
        }
    }
}

impl QuizState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a fresh run with `length` distinct questions from the bank.
    ///
    /// Uses a Fisher-Yates shuffle, so every ordering of the bank is equally
    /// likely as long as `rng` is uniform.
    pub fn start<R: Rng + ?Sized>(&mut self, bank: &QuestionBank, length: usize, rng: &mut R) {
        let mut order: Vec<usize> = (0..bank.len()).collect();
        order.shuffle(rng);
        order.truncate(length.clamp(1, bank.len()));

        let questions = order
            .iter()
            .map(|&index| bank.questions()[index].clone())
            .collect();
        *self = Self {
            attempt_id: Some(Uuid::new_v4()),
            questions,
            answers: Vec::with_capacity(order.len()),
            bank_indices: order,
            current: 0,
            score: 0,
            started: true,
            finished: false,
        };
    }

    pub fn total(&self) -> usize {
        self.questions.len()
    }

    /// Started and not yet finished.
    pub fn is_active(&self) -> bool {
        self.started && !self.finished
    }

    pub fn current_question(&self) -> Option<&Question> {
        if !self.is_active() {
            return None;
        }
        self.questions.get(self.current)
    }

    /// Commit an answer for the current question.
    ///
    /// Returns whether it was correct, or `None` when the quiz is not running.
    pub fn submit_answer(&mut self, key: ChoiceKey) -> Option<bool> {
        let question = self.current_question()?;
        let correct = question.is_correct(key);

        if correct {
            self.score += 1;
        }
        self.answers.push(AnswerRecord {
            question_index: self.current,
            answer: key,
            correct,
        });
        self.current += 1;
        if self.current >= self.total() {
            self.finished = true;
        }
        Some(correct)
    }

    /// Label-based entry point; labels outside A-D are ignored.
    #[cfg(test)]
    pub fn submit_label(&mut self, label: &str) -> Option<bool> {
        let key = ChoiceKey::from_label(label)?;
        self.submit_answer(key)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};
    use std::collections::HashSet;

    fn started(seed: u64) -> QuizState {
        let bank = QuestionBank::builtin().unwrap();
        let mut quiz = QuizState::new();
        quiz.start(&bank, DEFAULT_QUIZ_LENGTH, &mut StdRng::seed_from_u64(seed));
        quiz
    }

    #[test]
    fn start_draws_ten_distinct_questions() {
        let bank = QuestionBank::builtin().unwrap();
        for seed in 0..20 {
            let quiz = started(seed);
            assert_eq!(quiz.total(), 10);
            assert_eq!(quiz.current, 0);
            assert_eq!(quiz.score, 0);
            assert!(quiz.started && !quiz.finished);

            let prompts: HashSet<&str> =
                quiz.questions.iter().map(|q| q.prompt.as_str()).collect();
            assert_eq!(prompts.len(), 10);
            for (question, &index) in quiz.questions.iter().zip(&quiz.bank_indices) {
                assert_eq!(question, &bank.questions()[index]);
            }
        }
    }

    #[test]
    fn submit_before_start_is_a_noop() {
        let mut quiz = QuizState::new();
        assert_eq!(quiz.submit_answer(ChoiceKey::A), None);
        assert_eq!(quiz.current, 0);
        assert_eq!(quiz.score, 0);
    }

    #[test]
    fn correct_answer_scores_and_advances() {
        let mut quiz = started(1);
        let correct = quiz.current_question().unwrap().correct_key;

        assert_eq!(quiz.submit_answer(correct), Some(true));
        assert_eq!(quiz.score, 1);
        assert_eq!(quiz.current, 1);
    }

    #[test]
    fn answer_b_scores_on_question_keyed_b() {
        let options = ChoiceKey::ALL
            .into_iter()
            .map(|key| (key, format!("option {}", key.as_str())))
            .collect();
        let bank = QuestionBank::new(vec![Question {
            prompt: "Hoeveel poten heeft een spin?".into(),
            options,
            correct_key: ChoiceKey::B,
        }])
        .unwrap();
        let mut quiz = QuizState::new();
        quiz.start(&bank, 1, &mut StdRng::seed_from_u64(0));

        assert_eq!(quiz.submit_label("Z"), None);
        assert_eq!((quiz.current, quiz.score), (0, 0));

        assert_eq!(quiz.submit_label("B"), Some(true));
        assert_eq!((quiz.current, quiz.score), (1, 1));
        assert!(quiz.finished);
    }

    #[test]
    fn wrong_answer_only_advances() {
        let mut quiz = started(2);
        let correct = quiz.current_question().unwrap().correct_key;
        let wrong = ChoiceKey::ALL.into_iter().find(|k| *k != correct).unwrap();

        assert_eq!(quiz.submit_answer(wrong), Some(false));
        assert_eq!(quiz.score, 0);
        assert_eq!(quiz.current, 1);
    }

    #[test]
    fn invalid_label_leaves_state_unchanged() {
        let mut quiz = started(3);
        assert_eq!(quiz.submit_label("Z"), None);
        assert_eq!(quiz.current, 0);
        assert_eq!(quiz.score, 0);
        assert!(quiz.answers.is_empty());
    }

    #[test]
    fn finishing_freezes_the_score() {
        let mut quiz = started(4);
        while let Some(question) = quiz.current_question() {
            let key = question.correct_key;
            quiz.submit_answer(key);
        }

        assert!(quiz.finished);
        assert_eq!(quiz.current, 10);
        assert_eq!(quiz.score, 10);
        assert_eq!(quiz.submit_answer(ChoiceKey::A), None);
        assert_eq!(quiz.score, 10);
        assert!(quiz.current_question().is_none());
    }

    #[test]
    fn restart_draws_a_new_attempt() {
        let bank = QuestionBank::builtin().unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        let mut quiz = QuizState::new();
        quiz.start(&bank, 10, &mut rng);
        let first = quiz.attempt_id;
        quiz.submit_answer(ChoiceKey::B);

        quiz.start(&bank, 10, &mut rng);
        assert_ne!(quiz.attempt_id, first);
        assert_eq!(quiz.current, 0);
        assert!(quiz.answers.is_empty());
    }

    #[test]
    fn length_is_clamped_to_the_bank() {
        let bank = QuestionBank::builtin().unwrap();
        let mut quiz = QuizState::new();
        quiz.start(&bank, 500, &mut StdRng::seed_from_u64(6));
        assert_eq!(quiz.total(), bank.len());
    }
}
