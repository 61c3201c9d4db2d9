//! Translation between backend rows and model types.

use chrono::{DateTime, Utc};
use serde_json::Value;

use super::schema::{
    flashcards, profiles, quiz_attempts, quiz_questions, quiz_settings, quizzes, subject_notes,
    subjects,
};
use crate::backend::Row;
use crate::error::{AppError, Result};
use crate::models::{
    ActivityKind, Difficulty, Flashcard, NewNote, Note, Profile, ProfileUpdate, Quiz,
    QuizAttempt, QuizQuestion, QuizSettings, QuizSettingsUpdate, RecentActivity, Subject,
    SubjectIcon, DEFAULT_SUBJECT_COLOR,
};

pub const UNKNOWN_QUIZ: &str = "Unknown Quiz";
pub const UNKNOWN_SUBJECT: &str = "Unknown Subject";
pub const UNTITLED_QUIZ: &str = "Untitled Quiz";

fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    // Try RFC3339 first (e.g., "2026-01-11T12:34:56+00:00")
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    // Postgres timestamp without zone (e.g., "2026-01-11T12:34:56.123456")
    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    None
}

fn get_i64(row: &Row, column: &str) -> Option<i64> {
    match row.get(column)? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn get_f64(row: &Row, column: &str) -> Option<f64> {
    match row.get(column)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn get_string(row: &Row, column: &str) -> Option<String> {
    match row.get(column)? {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

/// Like `get_string`, but empty or whitespace-only text counts as absent.
fn get_text(row: &Row, column: &str) -> Option<String> {
    get_string(row, column).filter(|s| !s.trim().is_empty())
}

fn get_bool(row: &Row, column: &str) -> Option<bool> {
    row.get(column).and_then(Value::as_bool)
}

fn get_datetime(row: &Row, column: &str) -> Option<DateTime<Utc>> {
    get_string(row, column).and_then(|s| parse_datetime(&s))
}

fn require_i64(row: &Row, table: &str, column: &str) -> Result<i64> {
    get_i64(row, column)
        .ok_or_else(|| AppError::Mapping(format!("{}.{} missing or not an integer", table, column)))
}

fn require_string(row: &Row, table: &str, column: &str) -> Result<String> {
    get_string(row, column)
        .ok_or_else(|| AppError::Mapping(format!("{}.{} missing", table, column)))
}

pub fn subject_from_row(row: &Row) -> Result<Subject> {
    let title = get_text(row, subjects::TITLE)
        .or_else(|| get_text(row, subjects::NAME))
        .unwrap_or_default();
    Ok(Subject {
        id: require_i64(row, subjects::TABLE, subjects::ID)?,
        icon: SubjectIcon::for_title(&title),
        title,
        category: get_string(row, subjects::CATEGORY).unwrap_or_default(),
        color: get_text(row, subjects::COLOR).unwrap_or_else(|| DEFAULT_SUBJECT_COLOR.to_string()),
        description: get_string(row, subjects::DESCRIPTION).unwrap_or_default(),
        progress: 0,
    })
}

/// Display title of a subject row, for joins that only need the name.
pub fn subject_title(row: &Row) -> Option<String> {
    get_text(row, subjects::TITLE).or_else(|| get_text(row, subjects::NAME))
}

pub fn quiz_from_row(row: &Row) -> Result<Quiz> {
    let description = get_string(row, quizzes::DESCRIPTION).unwrap_or_default();
    let title = if description.trim().is_empty() {
        UNTITLED_QUIZ.to_string()
    } else {
        description.clone()
    };
    Ok(Quiz {
        id: require_i64(row, quizzes::TABLE, quizzes::ID)?,
        title,
        description,
        subject_id: get_i64(row, quizzes::SUBJECT_ID).unwrap_or(0),
        time_minutes: get_i64(row, quizzes::DURATION)
            .and_then(|m| u32::try_from(m).ok())
            .unwrap_or(0),
        question_count: 0,
    })
}

pub fn quiz_subject_id(row: &Row) -> Option<i64> {
    get_i64(row, quizzes::SUBJECT_ID)
}

/// Slot letter of a correct-option marker (`"b"`, `"B"`, `" B "` => 1).
fn marker_slot(marker: &str) -> Option<usize> {
    let mut chars = marker.trim().chars();
    let c = chars.next()?.to_ascii_uppercase();
    if chars.next().is_some() {
        return None;
    }
    match c {
        'A'..='D' => Some(c as usize - 'A' as usize),
        _ => None,
    }
}

pub fn question_from_row(row: &Row) -> Result<QuizQuestion> {
    let slots: [Option<String>; 4] = [
        get_text(row, quiz_questions::OPTION_A),
        get_text(row, quiz_questions::OPTION_B),
        get_text(row, quiz_questions::OPTION_C),
        get_text(row, quiz_questions::OPTION_D),
    ];
    let correct_answer = get_string(row, quiz_questions::CORRECT_OPTION).unwrap_or_default();

    // A letter marker names an original slot; shift it down by the blanks before it.
    let correct_index = match marker_slot(&correct_answer) {
        Some(slot) if slots[slot].is_some() => {
            Some(slots[..slot].iter().filter(|s| s.is_some()).count())
        }
        Some(_) => None,
        None => slots
            .iter()
            .flatten()
            .position(|opt| opt.trim() == correct_answer.trim()),
    };

    Ok(QuizQuestion {
        id: require_i64(row, quiz_questions::TABLE, quiz_questions::ID)?,
        quiz_id: get_i64(row, quiz_questions::QUIZ_ID).unwrap_or(0),
        question: get_string(row, quiz_questions::QUESTION_TEXT).unwrap_or_default(),
        options: slots.into_iter().flatten().collect(),
        correct_answer,
        correct_index,
    })
}

/// An attempt without a numeric score or a readable completion time is a
/// mapping error; `attempt_score` skips the same rows.
pub fn attempt_from_row(row: &Row) -> Result<QuizAttempt> {
    let score = attempt_score(row).ok_or_else(|| {
        AppError::Mapping(format!(
            "{}.{} missing or not a number",
            quiz_attempts::TABLE,
            quiz_attempts::SCORE
        ))
    })?;
    let completed_at = get_datetime(row, quiz_attempts::COMPLETED).ok_or_else(|| {
        AppError::Mapping(format!(
            "{}.{} missing or not a timestamp",
            quiz_attempts::TABLE,
            quiz_attempts::COMPLETED
        ))
    })?;
    Ok(QuizAttempt {
        id: require_i64(row, quiz_attempts::TABLE, quiz_attempts::ID)?,
        user_id: get_string(row, quiz_attempts::USER_ID).unwrap_or_default(),
        quiz_id: get_i64(row, quiz_attempts::QUIZ_ID).unwrap_or(0),
        score,
        completed_at,
    })
}

/// Score of an attempt row; `None` when absent or not a finite number.
pub fn attempt_score(row: &Row) -> Option<f64> {
    get_f64(row, quiz_attempts::SCORE).filter(|s| s.is_finite())
}

pub fn new_attempt_row(user_id: &str, quiz_id: i64, score: f64, completed: DateTime<Utc>) -> Row {
    let mut row = Row::new();
    row.insert(quiz_attempts::USER_ID.to_string(), Value::from(user_id));
    row.insert(quiz_attempts::QUIZ_ID.to_string(), Value::from(quiz_id));
    row.insert(quiz_attempts::SCORE.to_string(), Value::from(score));
    row.insert(
        quiz_attempts::COMPLETED.to_string(),
        Value::from(completed.to_rfc3339()),
    );
    row
}

pub fn activity_from_parts(
    attempt: &QuizAttempt,
    quiz_title: Option<String>,
    subject_title: Option<String>,
) -> RecentActivity {
    RecentActivity {
        kind: ActivityKind::Quiz,
        subject: subject_title.unwrap_or_else(|| UNKNOWN_SUBJECT.to_string()),
        title: quiz_title.unwrap_or_else(|| UNKNOWN_QUIZ.to_string()),
        completed_at: attempt.completed_at,
        score: attempt.score,
    }
}

pub fn flashcard_from_row(row: &Row) -> Result<Flashcard> {
    Ok(Flashcard {
        subject_id: get_i64(row, flashcards::SUBJECT_ID).unwrap_or(0),
        question: get_string(row, flashcards::QUESTION).unwrap_or_default(),
        answer: get_string(row, flashcards::ANSWER).unwrap_or_default(),
    })
}

pub fn profile_from_row(row: &Row) -> Result<Profile> {
    Ok(Profile {
        id: require_string(row, profiles::TABLE, profiles::ID)?,
        full_name: get_string(row, profiles::FULL_NAME).unwrap_or_default(),
        email: get_string(row, profiles::EMAIL),
        avatar_url: get_text(row, profiles::AVATAR_URL),
    })
}

pub fn profile_patch(update: &ProfileUpdate) -> Row {
    let mut row = Row::new();
    if let Some(name) = &update.full_name {
        row.insert(profiles::FULL_NAME.to_string(), Value::from(name.as_str()));
    }
    if let Some(url) = &update.avatar_url {
        row.insert(profiles::AVATAR_URL.to_string(), Value::from(url.as_str()));
    }
    row
}

pub fn settings_from_row(row: &Row) -> Result<QuizSettings> {
    let preferred_subject_ids = row
        .get(quiz_settings::PREFERRED_SUBJECT_IDS)
        .and_then(Value::as_array)
        .map(|ids| ids.iter().filter_map(Value::as_i64).collect())
        .unwrap_or_default();

    Ok(QuizSettings {
        id: get_string(row, quiz_settings::ID),
        user_id: require_string(row, quiz_settings::TABLE, quiz_settings::USER_ID)?,
        preferred_subject_ids,
        difficulty: get_string(row, quiz_settings::DIFFICULTY_LEVEL)
            .and_then(|s| Difficulty::parse(&s))
            .unwrap_or_default(),
        time_preference_minutes: get_i64(row, quiz_settings::TIME_PREFERENCE_MINUTES)
            .and_then(|m| u32::try_from(m).ok())
            .unwrap_or(30),
        notifications_enabled: get_bool(row, quiz_settings::NOTIFICATIONS_ENABLED).unwrap_or(true),
        created_at: get_datetime(row, quiz_settings::CREATED_AT),
        updated_at: get_datetime(row, quiz_settings::UPDATED_AT),
    })
}

/// Upsert payload carrying only the fields present in `update`.
pub fn settings_upsert_row(user_id: &str, update: &QuizSettingsUpdate, now: DateTime<Utc>) -> Row {
    let mut row = Row::new();
    row.insert(quiz_settings::USER_ID.to_string(), Value::from(user_id));
    if let Some(ids) = &update.preferred_subject_ids {
        row.insert(
            quiz_settings::PREFERRED_SUBJECT_IDS.to_string(),
            Value::from(ids.clone()),
        );
    }
    if let Some(difficulty) = update.difficulty {
        row.insert(
            quiz_settings::DIFFICULTY_LEVEL.to_string(),
            Value::from(difficulty.as_str()),
        );
    }
    if let Some(minutes) = update.time_preference_minutes {
        row.insert(
            quiz_settings::TIME_PREFERENCE_MINUTES.to_string(),
            Value::from(minutes),
        );
    }
    if let Some(enabled) = update.notifications_enabled {
        row.insert(
            quiz_settings::NOTIFICATIONS_ENABLED.to_string(),
            Value::from(enabled),
        );
    }
    row.insert(
        quiz_settings::UPDATED_AT.to_string(),
        Value::from(now.to_rfc3339()),
    );
    row
}

pub fn note_from_row(row: &Row) -> Result<Note> {
    Ok(Note {
        id: require_string(row, subject_notes::TABLE, subject_notes::ID)?,
        subject_id: get_i64(row, subject_notes::SUBJECT_ID),
        title: get_string(row, subject_notes::TITLE).unwrap_or_default(),
        content: get_string(row, subject_notes::CONTENT).unwrap_or_default(),
        created_at: get_datetime(row, subject_notes::CREATED_AT),
    })
}

pub fn new_note_row(note: &NewNote, now: DateTime<Utc>) -> Row {
    let mut row = Row::new();
    row.insert(subject_notes::SUBJECT_ID.to_string(), Value::from(note.subject_id));
    row.insert(subject_notes::TITLE.to_string(), Value::from(note.title.as_str()));
    row.insert(subject_notes::CONTENT.to_string(), Value::from(note.content.as_str()));
    row.insert(subject_notes::CREATED_AT.to_string(), Value::from(now.to_rfc3339()));
    row
}

/// Map every row, failing on the first row that does not fit.
pub fn map_rows<T>(rows: &[Row], f: impl Fn(&Row) -> Result<T>) -> Result<Vec<T>> {
    rows.iter().map(f).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn blank_option_is_dropped_and_letters_shift() {
        let q = question_from_row(&row(json!({
            "id": 10,
            "quiz_id": 2,
            "question_text": "Which?",
            "option_a": "A",
            "option_b": "",
            "option_c": "C",
            "option_d": "D",
            "correct_option": "C",
        })))
        .unwrap();

        assert_eq!(q.options, vec!["A", "C", "D"]);
        assert_eq!(q.correct_index, Some(1));
        let letters: Vec<char> = q.labeled_options().map(|(l, _)| l).collect();
        assert_eq!(letters, vec!['A', 'B', 'C']);
    }

    #[test]
    fn four_populated_options_keep_their_order() {
        let q = question_from_row(&row(json!({
            "id": 11,
            "quiz_id": 2,
            "question_text": "Order?",
            "option_a": "first",
            "option_b": "second",
            "option_c": "third",
            "option_d": "fourth",
            "correct_option": "d",
        })))
        .unwrap();

        assert_eq!(q.options, vec!["first", "second", "third", "fourth"]);
        assert_eq!(q.correct_index, Some(3));
    }

    #[test]
    fn null_options_and_text_markers() {
        let q = question_from_row(&row(json!({
            "id": 12,
            "option_a": "Paris",
            "option_b": null,
            "option_c": "Rome",
            "correct_option": "Rome",
        })))
        .unwrap();

        assert_eq!(q.options, vec!["Paris", "Rome"]);
        assert_eq!(q.correct_index, Some(1));
        assert_eq!(q.quiz_id, 0);
    }

    #[test]
    fn marker_pointing_at_blank_slot_is_unresolved() {
        let q = question_from_row(&row(json!({
            "id": 13,
            "option_a": "x",
            "option_b": "  ",
            "correct_option": "B",
        })))
        .unwrap();
        assert_eq!(q.correct_index, None);
    }

    #[test]
    fn quiz_title_comes_from_description() {
        let quiz = quiz_from_row(&row(json!({
            "id": 3,
            "description": "Algebra Basics",
            "subject_id": 1,
            "duration": 15,
        })))
        .unwrap();

        assert_eq!(quiz.title, "Algebra Basics");
        assert_eq!(quiz.description, "Algebra Basics");
        assert_eq!(quiz.time_minutes, 15);
        assert_eq!(quiz.question_count, 0);

        let untitled = quiz_from_row(&row(json!({"id": 4, "description": null}))).unwrap();
        assert_eq!(untitled.title, UNTITLED_QUIZ);
        assert_eq!(untitled.subject_id, 0);
    }

    #[test]
    fn flashcard_answer_comes_from_renamed_column() {
        let card = flashcard_from_row(&row(json!({
            "id": 1,
            "456": 9,
            "question": "2 + 2?",
            "elephant": "4",
        })))
        .unwrap();

        assert_eq!(card.subject_id, 9);
        assert_eq!(card.answer, "4");
    }

    #[test]
    fn subject_title_falls_back_to_name() {
        let subject = subject_from_row(&row(json!({
            "id": 1,
            "name": "Mathematics",
            "title": null,
            "category": "science",
        })))
        .unwrap();

        assert_eq!(subject.title, "Mathematics");
        assert_eq!(subject.icon, SubjectIcon::Calculator);
        assert_eq!(subject.color, DEFAULT_SUBJECT_COLOR);
        assert_eq!(subject.progress, 0);
    }

    #[test]
    fn subject_without_id_is_a_mapping_error() {
        let result = subject_from_row(&row(json!({"name": "History"})));
        assert!(matches!(result, Err(AppError::Mapping(_))));
    }

    #[test]
    fn settings_row_only_carries_given_fields() {
        let update = QuizSettingsUpdate {
            difficulty: Some(Difficulty::Hard),
            ..QuizSettingsUpdate::default()
        };
        let row = settings_upsert_row("u1", &update, Utc::now());

        assert_eq!(row.get("user_id"), Some(&json!("u1")));
        assert_eq!(row.get("difficulty_level"), Some(&json!("hard")));
        assert!(!row.contains_key("preferred_subject_ids"));
        assert!(!row.contains_key("notifications_enabled"));
    }

    #[test]
    fn attempt_rows_without_score_or_timestamp_do_not_map() {
        let no_score = row(json!({"id": 1, "quiz_id": 2, "completed": "2024-01-01T00:00:00Z"}));
        assert!(matches!(attempt_from_row(&no_score), Err(AppError::Mapping(_))));
        assert_eq!(attempt_score(&no_score), None);

        let bad_time = row(json!({"id": 2, "quiz_id": 2, "score": 60, "completed": "yesterday"}));
        assert!(matches!(attempt_from_row(&bad_time), Err(AppError::Mapping(_))));
        assert_eq!(attempt_score(&bad_time), Some(60.0));

        let ok = row(json!({"id": 3, "quiz_id": 2, "score": "75.5", "completed": "2024-01-01 08:00:00"}));
        let attempt = attempt_from_row(&ok).unwrap();
        assert_eq!(attempt.score, 75.5);
        assert_eq!(attempt.completed_at.to_rfc3339(), "2024-01-01T08:00:00+00:00");
    }

    #[test]
    fn parses_backend_timestamp_formats() {
        assert!(parse_datetime("2026-01-11T12:34:56+00:00").is_some());
        assert!(parse_datetime("2026-01-11T12:34:56.123456").is_some());
        assert!(parse_datetime("2026-01-11 12:34:56").is_some());
        assert!(parse_datetime("yesterday").is_none());
    }
}
