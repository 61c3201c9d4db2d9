use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use rand::distr::Alphanumeric;
use rand::Rng;

use crate::backend::{Filter, RemoteBackend, Row, Select};
use crate::error::{AppError, Result};
use crate::models::{
    Flashcard, NewNote, Note, Profile, ProfileUpdate, Quiz, QuizAttempt, QuizQuestion,
    QuizSettings, QuizSettingsUpdate, RecentActivity, Subject,
};
use crate::session::Session;

use super::rows;
use super::schema::{
    flashcards, profiles, quiz_attempts, quiz_questions, quiz_settings, quizzes, subject_notes,
    subjects, AVATAR_PREFIX,
};

const ACTIVITY_LOOKUP_CONCURRENCY: usize = 4;

/// One method per data operation, each a fixed number of backend round trips.
/// Errors are returned as-is; `api::DashboardApi` turns them into sentinels.
#[derive(Clone)]
pub struct Repository {
    backend: Arc<dyn RemoteBackend>,
    avatar_bucket: String,
}

impl Repository {
    pub fn new(backend: Arc<dyn RemoteBackend>, avatar_bucket: impl Into<String>) -> Self {
        Self {
            backend,
            avatar_bucket: avatar_bucket.into(),
        }
    }

    pub fn backend(&self) -> &dyn RemoteBackend {
        self.backend.as_ref()
    }

    async fn select_one(&self, query: Select) -> Result<Row> {
        self.backend
            .select(&query.limit(1))
            .await?
            .into_iter()
            .next()
            .ok_or(AppError::NotFound)
    }

    // Subject operations

    pub async fn list_subjects(&self) -> Result<Vec<Subject>> {
        let rows = self.backend.select(&Select::table(subjects::TABLE)).await?;
        rows::map_rows(&rows, rows::subject_from_row)
    }

    pub async fn get_subject(&self, id: i64) -> Result<Subject> {
        let row = self
            .select_one(Select::table(subjects::TABLE).eq(subjects::ID, id))
            .await?;
        rows::subject_from_row(&row)
    }

    // Quiz operations

    pub async fn list_quizzes_by_subject(&self, subject_id: i64) -> Result<Vec<Quiz>> {
        let rows = self
            .backend
            .select(
                &Select::table(quizzes::TABLE)
                    .columns(&[
                        quizzes::ID,
                        quizzes::DESCRIPTION,
                        quizzes::SUBJECT_ID,
                        quizzes::DURATION,
                    ])
                    .eq(quizzes::SUBJECT_ID, subject_id),
            )
            .await?;
        rows::map_rows(&rows, rows::quiz_from_row)
    }

    pub async fn get_quiz(&self, id: i64) -> Result<Quiz> {
        let row = self
            .select_one(Select::table(quizzes::TABLE).eq(quizzes::ID, id))
            .await?;
        rows::quiz_from_row(&row)
    }

    pub async fn list_quiz_questions(&self, quiz_id: i64) -> Result<Vec<QuizQuestion>> {
        let rows = self
            .backend
            .select(&Select::table(quiz_questions::TABLE).eq(quiz_questions::QUIZ_ID, quiz_id))
            .await?;
        rows::map_rows(&rows, rows::question_from_row)
    }

    /// Real question count for a quiz. Listing quizzes does not call this.
    pub async fn count_quiz_questions(&self, quiz_id: i64) -> Result<u32> {
        let rows = self
            .backend
            .select(
                &Select::table(quiz_questions::TABLE)
                    .columns(&[quiz_questions::ID])
                    .eq(quiz_questions::QUIZ_ID, quiz_id),
            )
            .await?;
        Ok(u32::try_from(rows.len()).unwrap_or(u32::MAX))
    }

    pub async fn quiz_ids_for_subject(&self, subject_id: i64) -> Result<Vec<i64>> {
        let rows = self
            .backend
            .select(
                &Select::table(quizzes::TABLE)
                    .columns(&[quizzes::ID])
                    .eq(quizzes::SUBJECT_ID, subject_id),
            )
            .await?;
        Ok(rows
            .iter()
            .filter_map(|row| rows::quiz_from_row(row).ok().map(|q| q.id))
            .collect())
    }

    // Attempt operations

    pub async fn submit_quiz_attempt(
        &self,
        session: &Session,
        quiz_id: i64,
        score: f64,
    ) -> Result<()> {
        let user = session.require_user()?;
        let row = rows::new_attempt_row(&user.id, quiz_id, score, Utc::now());
        self.backend.insert(quiz_attempts::TABLE, row).await
    }

    /// Scores of the caller's attempts on any of `quiz_ids`.
    pub async fn attempt_scores(&self, session: &Session, quiz_ids: &[i64]) -> Result<Vec<f64>> {
        let user = session.require_user()?;
        if quiz_ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = self
            .backend
            .select(
                &Select::table(quiz_attempts::TABLE)
                    .columns(&[quiz_attempts::SCORE, quiz_attempts::QUIZ_ID])
                    .eq(quiz_attempts::USER_ID, user.id.as_str())
                    .filter(Filter::is_in(quiz_attempts::QUIZ_ID, quiz_ids.iter().copied())),
            )
            .await?;
        Ok(rows.iter().filter_map(rows::attempt_score).collect())
    }

    pub async fn list_recent_activities(
        &self,
        session: &Session,
        limit: usize,
    ) -> Result<Vec<RecentActivity>> {
        let user = session.require_user()?;
        let rows = self
            .backend
            .select(
                &Select::table(quiz_attempts::TABLE)
                    .eq(quiz_attempts::USER_ID, user.id.as_str())
                    .order_by(quiz_attempts::COMPLETED, false)
                    .limit(limit),
            )
            .await?;
        let attempts: Vec<QuizAttempt> = rows
            .iter()
            .filter_map(|row| match rows::attempt_from_row(row) {
                Ok(attempt) => Some(attempt),
                Err(e) => {
                    tracing::warn!("Skipping attempt in activity feed: {}", e);
                    None
                }
            })
            .collect();

        // Relations resolve concurrently; `buffered` keeps attempt order.
        let activities: Vec<RecentActivity> = stream::iter(attempts)
            .map(|attempt| async move {
                let (quiz_title, subject_title) =
                    self.resolve_attempt_labels(attempt.quiz_id).await;
                rows::activity_from_parts(&attempt, quiz_title, subject_title)
            })
            .buffered(ACTIVITY_LOOKUP_CONCURRENCY)
            .collect()
            .await;

        Ok(activities)
    }

    /// Quiz and subject titles for an attempt. Lookup failures leave the
    /// title unset instead of failing the feed.
    async fn resolve_attempt_labels(&self, quiz_id: i64) -> (Option<String>, Option<String>) {
        let quiz = match self
            .select_one(
                Select::table(quizzes::TABLE)
                    .columns(&[quizzes::ID, quizzes::DESCRIPTION, quizzes::SUBJECT_ID])
                    .eq(quizzes::ID, quiz_id),
            )
            .await
        {
            Ok(row) => row,
            Err(e) => {
                tracing::warn!("Quiz {} for activity not resolved: {}", quiz_id, e);
                return (None, None);
            }
        };

        let quiz_title = rows::quiz_from_row(&quiz).ok().map(|q| q.title);
        let Some(subject_id) = rows::quiz_subject_id(&quiz) else {
            return (quiz_title, None);
        };

        let subject_title = match self
            .select_one(
                Select::table(subjects::TABLE)
                    .columns(&[subjects::ID, subjects::NAME, subjects::TITLE])
                    .eq(subjects::ID, subject_id),
            )
            .await
        {
            Ok(row) => rows::subject_title(&row),
            Err(e) => {
                tracing::warn!("Subject {} for activity not resolved: {}", subject_id, e);
                None
            }
        };

        (quiz_title, subject_title)
    }

    // Flashcard operations

    pub async fn list_flashcards_by_subject(&self, subject_id: i64) -> Result<Vec<Flashcard>> {
        let rows = self
            .backend
            .select(&Select::table(flashcards::TABLE).eq(flashcards::SUBJECT_ID, subject_id))
            .await?;
        rows::map_rows(&rows, rows::flashcard_from_row)
    }

    // Note operations

    pub async fn list_notes_by_subject(&self, subject_id: i64) -> Result<Vec<Note>> {
        let rows = self
            .backend
            .select(
                &Select::table(subject_notes::TABLE)
                    .eq(subject_notes::SUBJECT_ID, subject_id)
                    .order_by(subject_notes::CREATED_AT, false),
            )
            .await?;
        rows::map_rows(&rows, rows::note_from_row)
    }

    pub async fn create_note(&self, note: &NewNote) -> Result<()> {
        self.backend
            .insert(subject_notes::TABLE, rows::new_note_row(note, Utc::now()))
            .await
    }

    // Profile operations

    pub async fn get_profile(&self, session: &Session) -> Result<Profile> {
        let user = session.require_user()?;
        let row = self
            .select_one(Select::table(profiles::TABLE).eq(profiles::ID, user.id.as_str()))
            .await?;
        rows::profile_from_row(&row)
    }

    pub async fn update_profile(
        &self,
        session: &Session,
        update: &ProfileUpdate,
    ) -> Result<Profile> {
        let user = session.require_user()?;
        if update.is_empty() {
            return self.get_profile(session).await;
        }
        let updated = self
            .backend
            .update(
                profiles::TABLE,
                &[Filter::eq(profiles::ID, user.id.as_str())],
                rows::profile_patch(update),
            )
            .await?;
        let row = updated.into_iter().next().ok_or(AppError::NotFound)?;
        rows::profile_from_row(&row)
    }

    /// Remove the caller's auth identity, then their profile row.
    ///
    /// The identity goes first so a failure there leaves everything intact.
    /// If the identity is gone but the row delete fails, the row is orphaned
    /// and an error is returned; a repeat call cannot fix that since the
    /// identity no longer resolves, so it is logged for cleanup.
    pub async fn delete_profile(&self, session: &Session) -> Result<()> {
        let user = session.require_user()?;

        self.backend.delete_user(&user.id).await?;

        if let Err(e) = self
            .backend
            .delete(profiles::TABLE, &[Filter::eq(profiles::ID, user.id.as_str())])
            .await
        {
            tracing::error!(
                "Auth identity {} deleted but profile row remains: {}",
                user.id,
                e
            );
            return Err(e);
        }
        Ok(())
    }

    /// Store an avatar and point the caller's profile at it. Returns the public URL.
    pub async fn upload_avatar(
        &self,
        session: &Session,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<String> {
        let user = session.require_user()?;
        let object_name = avatar_object_name(&user.id, file_name);
        let path = format!("{}/{}", AVATAR_PREFIX, object_name);

        self.backend
            .upload(&self.avatar_bucket, &path, bytes, content_type_for(file_name))
            .await?;

        let url = self.backend.public_url(&self.avatar_bucket, &path);

        let mut patch = Row::new();
        patch.insert(profiles::AVATAR_URL.to_string(), url.clone().into());
        self.backend
            .update(
                profiles::TABLE,
                &[Filter::eq(profiles::ID, user.id.as_str())],
                patch,
            )
            .await?;

        Ok(url)
    }

    // Settings operations

    pub async fn get_quiz_settings(&self, session: &Session) -> Result<QuizSettings> {
        let user = session.require_user()?;
        let row = self
            .select_one(
                Select::table(quiz_settings::TABLE).eq(quiz_settings::USER_ID, user.id.as_str()),
            )
            .await?;
        rows::settings_from_row(&row)
    }

    /// Upsert keyed by user id: the first write creates the row, later writes
    /// only touch the fields they carry.
    pub async fn update_quiz_settings(
        &self,
        session: &Session,
        update: &QuizSettingsUpdate,
    ) -> Result<()> {
        let user = session.require_user()?;
        let row = rows::settings_upsert_row(&user.id, update, Utc::now());
        self.backend
            .upsert(quiz_settings::TABLE, row, quiz_settings::USER_ID)
            .await
    }

    /// Flip membership of `subject_id` in the preferred list and return the new list.
    pub async fn toggle_preferred_subject(
        &self,
        session: &Session,
        subject_id: i64,
    ) -> Result<Vec<i64>> {
        let current = match self.get_quiz_settings(session).await {
            Ok(settings) => settings,
            Err(AppError::NotFound) => QuizSettings {
                id: None,
                user_id: session.require_user()?.id.clone(),
                preferred_subject_ids: Vec::new(),
                difficulty: Default::default(),
                time_preference_minutes: 30,
                notifications_enabled: true,
                created_at: None,
                updated_at: None,
            },
            Err(e) => return Err(e),
        };

        let ids = current.toggled_subjects(subject_id);
        let update = QuizSettingsUpdate {
            preferred_subject_ids: Some(ids.clone()),
            ..QuizSettingsUpdate::default()
        };
        self.update_quiz_settings(session, &update).await?;
        Ok(ids)
    }
}

/// `<user>-<random>.<ext>`, keeping the upload's extension when it has one.
fn avatar_object_name(user_id: &str, file_name: &str) -> String {
    let suffix: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(12)
        .map(char::from)
        .collect::<String>()
        .to_lowercase();

    match Path::new(file_name).extension().and_then(|e| e.to_str()) {
        Some(ext) if !ext.is_empty() => format!("{}-{}.{}", user_id, suffix, ext),
        _ => format!("{}-{}", user_id, suffix),
    }
}

fn content_type_for(file_name: &str) -> &'static str {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn avatar_name_keeps_extension_and_varies() {
        let a = avatar_object_name("user-1", "me.PNG");
        let b = avatar_object_name("user-1", "me.PNG");

        assert!(a.starts_with("user-1-"));
        assert!(a.ends_with(".PNG"));
        assert_ne!(a, b);
        assert_eq!(avatar_object_name("u", "noext").matches('.').count(), 0);
    }

    #[test]
    fn content_type_from_extension() {
        assert_eq!(content_type_for("a.jpeg"), "image/jpeg");
        assert_eq!(content_type_for("a.PNG"), "image/png");
        assert_eq!(content_type_for("a.bin"), "application/octet-stream");
    }
}
