use chrono::Utc;
use log::warn;
use serde::Serialize;
use thiserror::Error;

use crate::question::{Answer, Question, QuizSession, UserAnswer, POINTS_PER_QUESTION};
use crate::store::QuestionStore;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CardError {
    #[error("the quiz card needs at least one question")]
    NoQuestions,
    #[error("all {0} questions have already been answered")]
    QuizFinished(usize),
    #[error("stored session has {answers} answer(s) for {questions} question(s)")]
    SessionTooLong { answers: usize, questions: usize },
    #[error("stored answer {index} is for question {found}, expected {expected}")]
    SessionMismatch {
        index: usize,
        expected: String,
        found: String,
    },
    #[error("stored answer {index} claims {found} point(s), a {answer:?} answer scores {expected}")]
    InvalidPoints {
        index: usize,
        answer: UserAnswer,
        expected: u32,
        found: u32,
    },
    #[error("stored answer points do not fit in a total")]
    PointsOverflow,
}

/// Text shown on the card; a pure function of the quiz progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardDisplayState {
    pub header_text: String,
    pub body_text: String,
    pub footer_text: String,
    pub button1_text: String,
    pub button2_text: String,
}

/// Progress through the question list plus the session being recorded.
#[derive(Debug, Clone)]
pub struct CardState {
    questions: Vec<Question>,
    current_question_index: usize,
    session: QuizSession,
}

impl CardState {
    pub fn new(questions: Vec<Question>) -> Result<Self, CardError> {
        if questions.is_empty() {
            return Err(CardError::NoQuestions);
        }
        Ok(Self {
            questions,
            current_question_index: 0,
            session: QuizSession::new(),
        })
    }

    /// Continues a stored session at `answers.len()`. The session must be a
    /// prefix of the question list.
    pub fn resume(questions: Vec<Question>, mut session: QuizSession) -> Result<Self, CardError> {
        let mut state = Self::new(questions)?;
        if session.len() > state.questions.len() {
            return Err(CardError::SessionTooLong {
                answers: session.len(),
                questions: state.questions.len(),
            });
        }
        for (index, (answer, question)) in session.answers.iter().zip(&state.questions).enumerate() {
            if answer.question_id != question.id {
                return Err(CardError::SessionMismatch {
                    index,
                    expected: question.id.to_string(),
                    found: answer.question_id.to_string(),
                });
            }
            let expected = Answer::score(question, answer.user_answer).points;
            if answer.points != expected {
                return Err(CardError::InvalidPoints {
                    index,
                    answer: answer.user_answer,
                    expected,
                    found: answer.points,
                });
            }
        }
        let total = session
            .points_from_answers()
            .ok_or(CardError::PointsOverflow)?;
        if session.total_points != total {
            warn!(
                "stored total of {} points disagrees with the answers; using {total}",
                session.total_points
            );
            session.total_points = total;
        }
        state.current_question_index = session.len();
        state.session = session;
        Ok(state)
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn current_index(&self) -> usize {
        self.current_question_index
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current_question_index)
    }

    pub fn is_finished(&self) -> bool {
        self.current_question_index >= self.questions.len()
    }

    pub fn total_points(&self) -> u32 {
        self.session.total_points
    }

    pub fn max_points(&self) -> u32 {
        self.questions.len() as u32 * POINTS_PER_QUESTION
    }

    pub fn session(&self) -> &QuizSession {
        &self.session
    }

    /// Scores the current question and moves to the next one.
    pub fn record_answer(&mut self, is_affirmative: bool) -> Result<Answer, CardError> {
        let question = self
            .current_question()
            .ok_or(CardError::QuizFinished(self.questions.len()))?;
        let answer = Answer::score(question, UserAnswer::from_affirmative(is_affirmative));
        self.session.push(answer.clone());
        self.current_question_index += 1;
        if self.is_finished() {
            self.session.completed_at = Some(Utc::now());
        }
        Ok(answer)
    }

    pub fn derive_display_text(&self) -> CardDisplayState {
        let total = self.questions.len();
        match self.current_question() {
            Some(question) => CardDisplayState {
                header_text: format!("Question {}/{}", self.current_question_index + 1, total),
                body_text: question.question.clone(),
                footer_text: format!("Total Points: {}", self.total_points()),
                button1_text: "Yes".to_string(),
                button2_text: "No".to_string(),
            },
            None => CardDisplayState {
                header_text: "Finished!".to_string(),
                body_text: format!(
                    "Your Final Score: {} out of {}",
                    self.total_points(),
                    self.max_points()
                ),
                footer_text: "Thank you for answering all questions".to_string(),
                button1_text: "Restart".to_string(),
                button2_text: "Exit".to_string(),
            },
        }
    }

    /// Starts over from the first question and drops the stored session.
    /// A failed delete is logged; the in-memory reset still happens.
    pub fn restart(&mut self, store: &QuestionStore) {
        self.current_question_index = 0;
        self.session = QuizSession::new();
        if let Err(err) = store.clear_session() {
            warn!("failed to clear stored session: {err:?}");
        }
    }
}
