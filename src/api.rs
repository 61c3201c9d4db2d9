//! Fail-soft entry points for the presentation layer.
//!
//! Every method here returns an empty list, `None` or `false` instead of an
//! error. The reason is logged; callers that need to tell "empty" from
//! "failed" should use `Repository` directly.

use std::future::Future;

use crate::db::Repository;
use crate::error::{AppError, Result};
use crate::models::{
    Flashcard, NewNote, Note, Profile, ProfileUpdate, Quiz, QuizQuestion, QuizSettings,
    QuizSettingsUpdate, RecentActivity, Subject,
};
use crate::progress;
use crate::session::Session;

fn log_failure(operation: &str, error: &AppError) {
    if error.is_expected() {
        tracing::warn!("{}: {}", operation, error);
    } else {
        tracing::error!("{} failed: {}", operation, error);
    }
}

async fn soft<T>(operation: &str, fut: impl Future<Output = Result<T>>) -> Option<T> {
    match fut.await {
        Ok(value) => Some(value),
        Err(e) => {
            log_failure(operation, &e);
            None
        }
    }
}

#[derive(Clone)]
pub struct DashboardApi {
    repo: Repository,
    session: Session,
}

impl DashboardApi {
    pub fn new(repo: Repository, session: Session) -> Self {
        Self { repo, session }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn repository(&self) -> &Repository {
        &self.repo
    }

    pub async fn list_subjects(&self) -> Vec<Subject> {
        soft("list subjects", self.repo.list_subjects())
            .await
            .unwrap_or_default()
    }

    pub async fn get_subject(&self, id: i64) -> Option<Subject> {
        soft("get subject", self.repo.get_subject(id)).await
    }

    pub async fn subject_progress(&self, subject_id: i64) -> u8 {
        soft(
            "subject progress",
            progress::subject_progress(&self.repo, &self.session, subject_id),
        )
        .await
        .unwrap_or(0)
    }

    pub async fn list_quizzes_by_subject(&self, subject_id: i64) -> Vec<Quiz> {
        soft("list quizzes", self.repo.list_quizzes_by_subject(subject_id))
            .await
            .unwrap_or_default()
    }

    pub async fn get_quiz(&self, id: i64) -> Option<Quiz> {
        soft("get quiz", self.repo.get_quiz(id)).await
    }

    pub async fn list_quiz_questions(&self, quiz_id: i64) -> Vec<QuizQuestion> {
        soft("list quiz questions", self.repo.list_quiz_questions(quiz_id))
            .await
            .unwrap_or_default()
    }

    pub async fn count_quiz_questions(&self, quiz_id: i64) -> u32 {
        soft("count quiz questions", self.repo.count_quiz_questions(quiz_id))
            .await
            .unwrap_or(0)
    }

    pub async fn submit_quiz_attempt(&self, quiz_id: i64, score: f64) -> bool {
        soft(
            "submit quiz attempt",
            self.repo.submit_quiz_attempt(&self.session, quiz_id, score),
        )
        .await
        .is_some()
    }

    pub async fn list_flashcards_by_subject(&self, subject_id: i64) -> Vec<Flashcard> {
        soft("list flashcards", self.repo.list_flashcards_by_subject(subject_id))
            .await
            .unwrap_or_default()
    }

    pub async fn list_recent_activities(&self, limit: usize) -> Vec<RecentActivity> {
        soft(
            "list recent activities",
            self.repo.list_recent_activities(&self.session, limit),
        )
        .await
        .unwrap_or_default()
    }

    pub async fn list_notes_by_subject(&self, subject_id: i64) -> Vec<Note> {
        soft("list notes", self.repo.list_notes_by_subject(subject_id))
            .await
            .unwrap_or_default()
    }

    pub async fn create_note(&self, note: &NewNote) -> bool {
        soft("create note", self.repo.create_note(note)).await.is_some()
    }

    pub async fn get_profile(&self) -> Option<Profile> {
        soft("get profile", self.repo.get_profile(&self.session)).await
    }

    pub async fn update_profile(&self, update: &ProfileUpdate) -> Option<Profile> {
        soft(
            "update profile",
            self.repo.update_profile(&self.session, update),
        )
        .await
    }

    pub async fn delete_profile(&self) -> bool {
        soft("delete profile", self.repo.delete_profile(&self.session))
            .await
            .is_some()
    }

    pub async fn upload_avatar(&self, file_name: &str, bytes: Vec<u8>) -> Option<String> {
        soft(
            "upload avatar",
            self.repo.upload_avatar(&self.session, file_name, bytes),
        )
        .await
    }

    pub async fn get_quiz_settings(&self) -> Option<QuizSettings> {
        soft("get quiz settings", self.repo.get_quiz_settings(&self.session)).await
    }

    pub async fn update_quiz_settings(&self, update: &QuizSettingsUpdate) -> bool {
        soft(
            "update quiz settings",
            self.repo.update_quiz_settings(&self.session, update),
        )
        .await
        .is_some()
    }

    pub async fn toggle_preferred_subject(&self, subject_id: i64) -> Option<Vec<i64>> {
        soft(
            "toggle preferred subject",
            self.repo.toggle_preferred_subject(&self.session, subject_id),
        )
        .await
    }
}
