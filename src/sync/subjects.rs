use futures::stream::{self, StreamExt};
use tokio::sync::watch;

use super::{settle, LoadStatus, Notifier};
use crate::db::Repository;
use crate::models::Subject;
use crate::progress;
use crate::session::Session;

const PROGRESS_CONCURRENCY: usize = 4;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubjectsState {
    pub subjects: Vec<Subject>,
    pub status: LoadStatus,
}

impl SubjectsState {
    pub fn is_loading(&self) -> bool {
        self.status == LoadStatus::Loading
    }
}

pub struct SubjectsStore {
    repo: Repository,
    session: Session,
    notifier: Notifier,
    with_progress: bool,
    state: watch::Sender<SubjectsState>,
}

impl SubjectsStore {
    pub fn new(repo: Repository, session: Session, notifier: Notifier) -> Self {
        let (state, _) = watch::channel(SubjectsState::default());
        Self {
            repo,
            session,
            notifier,
            with_progress: false,
            state,
        }
    }

    /// Also compute each subject's progress after listing.
    pub fn with_progress(mut self) -> Self {
        self.with_progress = true;
        self
    }

    pub fn subscribe(&self) -> watch::Receiver<SubjectsState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> SubjectsState {
        self.state.borrow().clone()
    }

    /// Load once. Later calls are no-ops; use `refresh` to reload.
    pub async fn activate(&self) {
        if self.state.borrow().status == LoadStatus::Idle {
            self.refresh().await;
        }
    }

    pub async fn refresh(&self) -> Vec<Subject> {
        self.state.send_modify(|s| s.status = LoadStatus::Loading);

        let mut failures = Vec::new();
        let mut subjects = settle(
            self.repo.list_subjects().await,
            "Failed to load subjects",
            &mut failures,
        );

        if self.with_progress && !subjects.is_empty() {
            self.fill_progress(&mut subjects).await;
        }

        self.state.send_modify(|s| {
            s.subjects = subjects.clone();
            s.status = LoadStatus::Ready;
        });
        for failure in failures {
            self.notifier.notify(failure);
        }
        subjects
    }

    /// One calculation per subject, a few at a time, in list order.
    async fn fill_progress(&self, subjects: &mut [Subject]) {
        let ids: Vec<i64> = subjects.iter().map(|s| s.id).collect();
        let values: Vec<u8> = stream::iter(ids)
            .map(|id| async move {
                match progress::subject_progress(&self.repo, &self.session, id).await {
                    Ok(value) => value,
                    Err(e) => {
                        tracing::warn!("Progress for subject {} unavailable: {}", id, e);
                        0
                    }
                }
            })
            .buffered(PROGRESS_CONCURRENCY)
            .collect()
            .await;

        for (subject, value) in subjects.iter_mut().zip(values) {
            subject.progress = value;
        }
    }
}
