use serde::{Deserialize, Serialize};

pub const DEFAULT_SUBJECT_COLOR: &str = "bg-edu-purple";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    pub id: i64,
    pub title: String,
    pub category: String,
    pub icon: SubjectIcon,
    pub color: String,
    pub description: String,
    /// Mean attempt score for the current user, 0..=100. Never persisted.
    pub progress: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SubjectIcon {
    Calculator,
    Atom,
    Scroll,
    BookText,
    Globe,
    BookOpen,
    CircleDot,
    Brain,
    #[default]
    GraduationCap,
}

impl SubjectIcon {
    /// Pick the icon for a subject title, case-insensitively.
    pub fn for_title(title: &str) -> Self {
        match title.trim().to_lowercase().as_str() {
            "mathematics" | "math" => SubjectIcon::Calculator,
            "physics" => SubjectIcon::Atom,
            "literature" => SubjectIcon::Scroll,
            "english" => SubjectIcon::BookText,
            "history" => SubjectIcon::Globe,
            "computer science" => SubjectIcon::BookOpen,
            "chemistry" => SubjectIcon::CircleDot,
            "biology" => SubjectIcon::Brain,
            _ => SubjectIcon::GraduationCap,
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            SubjectIcon::Calculator => "calculator",
            SubjectIcon::Atom => "atom",
            SubjectIcon::Scroll => "scroll",
            SubjectIcon::BookText => "book-text",
            SubjectIcon::Globe => "globe",
            SubjectIcon::BookOpen => "book-open",
            SubjectIcon::CircleDot => "circle-dot",
            SubjectIcon::Brain => "brain",
            SubjectIcon::GraduationCap => "graduation-cap",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn icon_lookup_ignores_case_and_falls_back() {
        assert_eq!(SubjectIcon::for_title("Mathematics"), SubjectIcon::Calculator);
        assert_eq!(SubjectIcon::for_title("MATH"), SubjectIcon::Calculator);
        assert_eq!(SubjectIcon::for_title("Computer Science"), SubjectIcon::BookOpen);
        assert_eq!(SubjectIcon::for_title("Underwater Basket Weaving"), SubjectIcon::GraduationCap);
        assert_eq!(SubjectIcon::for_title(""), SubjectIcon::GraduationCap);
    }
}
