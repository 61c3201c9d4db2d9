#![allow(dead_code)]

use std::sync::Arc;

use serde_json::{json, Value};
use study_dashboard::backend::{AuthUser, MemoryBackend};
use study_dashboard::{DashboardApi, Repository, Session};

pub const USER_ID: &str = "user-1";
pub const TOKEN: &str = "token-1";

pub struct Fixture {
    pub backend: MemoryBackend,
    pub repo: Repository,
    pub session: Session,
}

impl Fixture {
    pub fn api(&self) -> DashboardApi {
        DashboardApi::new(self.repo.clone(), self.session.clone())
    }

    pub fn anonymous_api(&self) -> DashboardApi {
        DashboardApi::new(self.repo.clone(), Session::anonymous())
    }

    pub fn subject(&self, id: i64, name: &str) {
        self.backend
            .seed("subjects", json!({"id": id, "name": name, "title": null, "category": "general"}));
    }

    pub fn quiz(&self, id: i64, subject_id: i64, title: &str) {
        self.backend.seed(
            "quizzes",
            json!({"id": id, "description": title, "subject_id": subject_id, "duration": 10}),
        );
    }

    pub fn attempt(&self, user_id: &str, quiz_id: i64, score: f64, completed: &str) {
        self.backend.seed(
            "quiz_attempts",
            json!({"user_id": user_id, "quiz_id": quiz_id, "score": score, "completed": completed}),
        );
    }

    pub fn profile(&self, avatar_url: Option<&str>) {
        self.backend.seed(
            "profiles",
            json!({
                "id": USER_ID,
                "full_name": "Ada Student",
                "email": "ada@example.com",
                "avatar_url": avatar_url,
            }),
        );
    }

    pub fn rows(&self, table: &str) -> Vec<serde_json::Map<String, Value>> {
        self.backend.rows(table)
    }
}

pub async fn signed_in() -> Fixture {
    let backend = MemoryBackend::new();
    backend.sign_in(
        TOKEN,
        AuthUser {
            id: USER_ID.to_string(),
            email: Some("ada@example.com".to_string()),
        },
    );
    let session = Session::resolve(&backend, Some(TOKEN)).await;
    assert!(session.is_authenticated());
    let repo = Repository::new(Arc::new(backend.clone()), "avatars");
    Fixture {
        backend,
        repo,
        session,
    }
}
