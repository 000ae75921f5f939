use std::fmt;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Points awarded for every affirmative answer.
pub const POINTS_PER_QUESTION: u32 = 25;

/// Identifier of a question; stores emit either numeric or string ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QuestionId {
    Number(i64),
    Text(String),
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(id) => write!(f, "{id}"),
            Self::Text(id) => f.write_str(id),
        }
    }
}

/// A single quiz question as read from the `Questions` key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    pub question: String,
    #[serde(default)]
    pub answer: Value,
}

impl Question {
    pub fn new(id: i64, question: impl Into<String>, answer: impl Into<Value>) -> Self {
        Self {
            id: QuestionId::Number(id),
            question: question.into(),
            answer: answer.into(),
        }
    }
}

/// Parses a JSON array of questions.
pub fn parse_questions(json: &str) -> Result<Vec<Question>> {
    serde_json::from_str(json).context("questions must be a JSON array of {id, question, answer}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserAnswer {
    Yes,
    No,
}

impl UserAnswer {
    pub fn from_affirmative(is_affirmative: bool) -> Self {
        if is_affirmative {
            Self::Yes
        } else {
            Self::No
        }
    }

    pub fn is_affirmative(self) -> bool {
        matches!(self, Self::Yes)
    }
}

/// Recorded response to one question. Never mutated once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    pub question_id: QuestionId,
    pub question: String,
    pub user_answer: UserAnswer,
    #[serde(default)]
    pub correct_answer: Value,
    pub points: u32,
}

impl Answer {
    /// Scores `question`: every "yes" earns [`POINTS_PER_QUESTION`] regardless
    /// of the question's expected answer.
    pub fn score(question: &Question, user_answer: UserAnswer) -> Self {
        let points = if user_answer.is_affirmative() {
            POINTS_PER_QUESTION
        } else {
            0
        };
        Self {
            question_id: question.id.clone(),
            question: question.question.clone(),
            user_answer,
            correct_answer: question.answer.clone(),
            points,
        }
    }
}

/// Ordered record of one quiz attempt, persisted under `UserAnswers`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizSession {
    #[serde(default)]
    pub answers: Vec<Answer>,
    #[serde(default)]
    pub total_points: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl QuizSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, answer: Answer) {
        self.total_points = self.total_points.saturating_add(answer.points);
        self.answers.push(answer);
    }

    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    /// Sum of the points of every recorded answer, `None` on overflow.
    pub fn points_from_answers(&self) -> Option<u32> {
        self.answers
            .iter()
            .try_fold(0u32, |total, answer| total.checked_add(answer.points))
    }

    /// Returns true when `total_points` agrees with the recorded answers.
    pub fn is_consistent(&self) -> bool {
        self.points_from_answers() == Some(self.total_points)
    }
}
