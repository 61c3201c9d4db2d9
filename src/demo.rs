//! Sample data for running without a hosted backend.

use chrono::{Duration, Utc};
use serde_json::json;

use crate::backend::{AuthUser, MemoryBackend};

pub const DEMO_TOKEN: &str = "demo-token";
pub const DEMO_USER_ID: &str = "00000000-0000-0000-0000-000000000001";

/// Fill `backend` with a signed-in student, a few subjects and some history.
/// Returns the access token for that student.
pub fn seed(backend: &MemoryBackend) -> &'static str {
    backend.sign_in(
        DEMO_TOKEN,
        AuthUser {
            id: DEMO_USER_ID.to_string(),
            email: Some("student@example.com".to_string()),
        },
    );
    backend.seed(
        "profiles",
        json!({
            "id": DEMO_USER_ID,
            "full_name": "Demo Student",
            "email": "student@example.com",
            "avatar_url": null,
        }),
    );

    let math = backend.seed(
        "subjects",
        json!({"name": "Mathematics", "title": null, "category": "science", "description": "Numbers and structure"}),
    );
    let history = backend.seed(
        "subjects",
        json!({"name": "History", "title": "History", "category": "humanities", "description": "The past, examined"}),
    );
    backend.seed(
        "subjects",
        json!({"name": "Biology", "title": null, "category": "science", "description": "Living things"}),
    );

    let algebra = backend.seed(
        "quizzes",
        json!({"description": "Algebra Basics", "subject_id": math, "duration": 15, "quiz_code": 101}),
    );
    let geometry = backend.seed(
        "quizzes",
        json!({"description": "Geometry", "subject_id": math, "duration": 20, "quiz_code": 102}),
    );
    let wars = backend.seed(
        "quizzes",
        json!({"description": "World Wars", "subject_id": history, "duration": 25, "quiz_code": 201}),
    );

    backend.seed(
        "quiz_questions",
        json!({
            "quiz_id": algebra,
            "question_text": "Solve for x: 2x + 3 = 7",
            "option_a": "1",
            "option_b": "2",
            "option_c": "",
            "option_d": "4",
            "correct_option": "B",
        }),
    );
    backend.seed(
        "quiz_questions",
        json!({
            "quiz_id": algebra,
            "question_text": "What is 3 squared?",
            "option_a": "6",
            "option_b": "9",
            "option_c": "12",
            "option_d": "27",
            "correct_option": "B",
        }),
    );

    backend.seed("flashcards", json!({"456": math, "question": "Pythagoras?", "elephant": "a² + b² = c²"}));
    backend.seed("flashcards", json!({"456": history, "question": "WW2 ended?", "elephant": "1945"}));

    let now = Utc::now();
    for (quiz, score, days_ago) in [(algebra, 70, 3), (geometry, 90, 2), (wars, 65, 1)] {
        backend.seed(
            "quiz_attempts",
            json!({
                "user_id": DEMO_USER_ID,
                "quiz_id": quiz,
                "score": score,
                "completed": (now - Duration::days(days_ago)).to_rfc3339(),
            }),
        );
    }

    backend.seed(
        "subject_notes",
        json!({
            "id": "note-1",
            "subject_id": math,
            "Title": "Quadratics",
            "Content": "Remember the discriminant.",
            "created_at": now.to_rfc3339(),
        }),
    );

    DEMO_TOKEN
}
