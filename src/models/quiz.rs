use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quiz {
    pub id: i64,
    pub title: String,
    /// Same underlying value as `title`.
    pub description: String,
    pub subject_id: i64,
    pub time_minutes: u32,
    /// Not stored with the quiz. Listing leaves it at 0; see
    /// `Repository::count_quiz_questions` for the real number.
    pub question_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub id: i64,
    pub quiz_id: i64,
    pub question: String,
    /// Non-blank options in their original A-D order.
    pub options: Vec<String>,
    /// Marker as stored: a slot letter or the option text itself.
    pub correct_answer: String,
    /// Position of the correct option within `options`, if it could be resolved.
    pub correct_index: Option<usize>,
}

impl QuizQuestion {
    /// Options paired with their display letter, lettered by position in the
    /// filtered list rather than by original slot.
    pub fn labeled_options(&self) -> impl Iterator<Item = (char, &str)> {
        self.options
            .iter()
            .enumerate()
            .map(|(i, opt)| (option_label(i), opt.as_str()))
    }

    pub fn is_correct(&self, choice: usize) -> bool {
        self.correct_index == Some(choice)
    }
}

/// Display letter for the option at `index`: 0 => 'A', 1 => 'B', ...
pub fn option_label(index: usize) -> char {
    (b'A' + (index % 26) as u8) as char
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizAttempt {
    pub id: i64,
    pub user_id: String,
    pub quiz_id: i64,
    pub score: f64,
    pub completed_at: DateTime<Utc>,
}
