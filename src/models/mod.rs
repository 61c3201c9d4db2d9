mod activity;
mod flashcard;
mod note;
mod profile;
mod quiz;
mod settings;
mod subject;

pub use activity::{ActivityKind, RecentActivity};
pub use flashcard::Flashcard;
pub use note::{NewNote, Note};
pub use profile::{Profile, ProfileUpdate};
pub use quiz::{option_label, Quiz, QuizAttempt, QuizQuestion};
pub use settings::{Difficulty, QuizSettings, QuizSettingsUpdate};
pub use subject::{Subject, SubjectIcon, DEFAULT_SUBJECT_COLOR};
