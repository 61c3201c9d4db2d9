use tokio::sync::watch;

use super::{settle, LoadStatus, Notifier};
use crate::db::Repository;
use crate::models::{Flashcard, Quiz};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubjectContentState {
    pub active_subject: Option<i64>,
    pub quizzes: Vec<Quiz>,
    pub flashcards: Vec<Flashcard>,
    pub status: LoadStatus,
    request: u64,
}

impl SubjectContentState {
    pub fn is_loading(&self) -> bool {
        self.status == LoadStatus::Loading
    }
}

/// Quizzes and flashcards of the selected subject. Nothing is kept for
/// subjects that are no longer selected.
pub struct SubjectContentStore {
    repo: Repository,
    notifier: Notifier,
    state: watch::Sender<SubjectContentState>,
}

impl SubjectContentStore {
    pub fn new(repo: Repository, notifier: Notifier) -> Self {
        let (state, _) = watch::channel(SubjectContentState::default());
        Self {
            repo,
            notifier,
            state,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SubjectContentState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> SubjectContentState {
        self.state.borrow().clone()
    }

    /// Fetch both lists for `subject_id` concurrently and publish them together.
    ///
    /// Each call is tagged; if another selection starts before this one
    /// finishes, this call's results are dropped on arrival. Returns whether
    /// the results were applied.
    pub async fn select_subject(&self, subject_id: i64) -> bool {
        let mut request = 0;
        self.state.send_modify(|s| {
            s.request += 1;
            request = s.request;
            s.active_subject = Some(subject_id);
            s.status = LoadStatus::Loading;
        });

        let (quizzes, flashcards) = tokio::join!(
            self.repo.list_quizzes_by_subject(subject_id),
            self.repo.list_flashcards_by_subject(subject_id),
        );

        let mut failures = Vec::new();
        let quizzes = settle(quizzes, "Failed to load subject quizzes", &mut failures);
        let flashcards = settle(flashcards, "Failed to load subject flashcards", &mut failures);

        let applied = self.state.send_if_modified(|s| {
            if s.request != request {
                return false;
            }
            s.quizzes = quizzes;
            s.flashcards = flashcards;
            s.status = LoadStatus::Ready;
            true
        });

        if applied {
            for failure in failures {
                self.notifier.notify(failure);
            }
        } else {
            tracing::debug!("Dropping stale content for subject {}", subject_id);
        }
        applied
    }
}
