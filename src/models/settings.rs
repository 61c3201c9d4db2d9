use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "medium" => Some(Difficulty::Medium),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizSettings {
    pub id: Option<String>,
    pub user_id: String,
    pub preferred_subject_ids: Vec<i64>,
    pub difficulty: Difficulty,
    pub time_preference_minutes: u32,
    pub notifications_enabled: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl QuizSettings {
    /// Remove `subject_id` if present, add it otherwise. Never introduces duplicates.
    pub fn toggled_subjects(&self, subject_id: i64) -> Vec<i64> {
        let mut ids: Vec<i64> = Vec::with_capacity(self.preferred_subject_ids.len() + 1);
        for id in &self.preferred_subject_ids {
            if !ids.contains(id) {
                ids.push(*id);
            }
        }
        if let Some(pos) = ids.iter().position(|id| *id == subject_id) {
            ids.remove(pos);
        } else {
            ids.push(subject_id);
        }
        ids
    }
}

/// Partial settings write. `None` fields are left untouched by the upsert.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuizSettingsUpdate {
    pub preferred_subject_ids: Option<Vec<i64>>,
    pub difficulty: Option<Difficulty>,
    pub time_preference_minutes: Option<u32>,
    pub notifications_enabled: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings_with(ids: Vec<i64>) -> QuizSettings {
        QuizSettings {
            id: None,
            user_id: "u1".to_string(),
            preferred_subject_ids: ids,
            difficulty: Difficulty::Medium,
            time_preference_minutes: 30,
            notifications_enabled: true,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn toggle_adds_then_removes() {
        let settings = settings_with(vec![1, 2]);
        assert_eq!(settings.toggled_subjects(3), vec![1, 2, 3]);
        assert_eq!(settings.toggled_subjects(2), vec![1]);
    }

    #[test]
    fn toggle_collapses_stored_duplicates() {
        let settings = settings_with(vec![4, 4, 5]);
        assert_eq!(settings.toggled_subjects(4), vec![5]);
    }

    #[test]
    fn difficulty_parse_is_lenient_on_case() {
        assert_eq!(Difficulty::parse("HARD"), Some(Difficulty::Hard));
        assert_eq!(Difficulty::parse("extreme"), None);
    }
}
