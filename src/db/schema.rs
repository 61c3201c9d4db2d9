//! Table and column names as they exist on the hosted backend. Several of
//! them do not match the model field they feed; `rows` is the only module
//! that should translate between the two.

pub mod subjects {
    pub const TABLE: &str = "subjects";
    pub const ID: &str = "id";
    pub const NAME: &str = "name";
    pub const TITLE: &str = "title";
    pub const CATEGORY: &str = "category";
    pub const COLOR: &str = "color";
    pub const DESCRIPTION: &str = "description";
}

pub mod quizzes {
    pub const TABLE: &str = "quizzes";
    pub const ID: &str = "id";
    /// Holds the quiz title.
    pub const DESCRIPTION: &str = "description";
    pub const SUBJECT_ID: &str = "subject_id";
    /// Minutes.
    pub const DURATION: &str = "duration";
}

pub mod quiz_questions {
    pub const TABLE: &str = "quiz_questions";
    pub const ID: &str = "id";
    pub const QUIZ_ID: &str = "quiz_id";
    pub const QUESTION_TEXT: &str = "question_text";
    pub const OPTION_A: &str = "option_a";
    pub const OPTION_B: &str = "option_b";
    pub const OPTION_C: &str = "option_c";
    pub const OPTION_D: &str = "option_d";
    pub const CORRECT_OPTION: &str = "correct_option";
}

pub mod quiz_attempts {
    pub const TABLE: &str = "quiz_attempts";
    pub const ID: &str = "id";
    pub const USER_ID: &str = "user_id";
    pub const QUIZ_ID: &str = "quiz_id";
    pub const SCORE: &str = "score";
    /// Completion timestamp.
    pub const COMPLETED: &str = "completed";
}

pub mod flashcards {
    pub const TABLE: &str = "flashcards";
    pub const ID: &str = "id";
    /// Foreign key to subjects.
    pub const SUBJECT_ID: &str = "456";
    pub const QUESTION: &str = "question";
    /// Holds the answer text.
    pub const ANSWER: &str = "elephant";
}

pub mod profiles {
    pub const TABLE: &str = "profiles";
    pub const ID: &str = "id";
    pub const FULL_NAME: &str = "full_name";
    pub const EMAIL: &str = "email";
    pub const AVATAR_URL: &str = "avatar_url";
}

pub mod quiz_settings {
    pub const TABLE: &str = "quiz_settings";
    pub const ID: &str = "id";
    pub const USER_ID: &str = "user_id";
    pub const PREFERRED_SUBJECT_IDS: &str = "preferred_subject_ids";
    pub const DIFFICULTY_LEVEL: &str = "difficulty_level";
    pub const TIME_PREFERENCE_MINUTES: &str = "time_preference_minutes";
    pub const NOTIFICATIONS_ENABLED: &str = "notifications_enabled";
    pub const CREATED_AT: &str = "created_at";
    pub const UPDATED_AT: &str = "updated_at";
}

pub mod subject_notes {
    pub const TABLE: &str = "subject_notes";
    pub const ID: &str = "id";
    pub const SUBJECT_ID: &str = "subject_id";
    pub const TITLE: &str = "Title";
    pub const CONTENT: &str = "Content";
    pub const CREATED_AT: &str = "created_at";
}

/// Storage path prefix for uploaded avatars, inside the avatar bucket.
pub const AVATAR_PREFIX: &str = "avatars";
