use tokio::sync::watch;

use super::{settle, LoadStatus, Notifier};
use crate::db::Repository;
use crate::models::RecentActivity;
use crate::session::Session;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecentActivityState {
    pub activities: Vec<RecentActivity>,
    pub limit: usize,
    pub status: LoadStatus,
    request: u64,
}

impl RecentActivityState {
    pub fn is_loading(&self) -> bool {
        self.status == LoadStatus::Loading
    }
}

pub struct RecentActivityStore {
    repo: Repository,
    session: Session,
    notifier: Notifier,
    state: watch::Sender<RecentActivityState>,
}

impl RecentActivityStore {
    pub fn new(repo: Repository, session: Session, notifier: Notifier, limit: usize) -> Self {
        let (state, _) = watch::channel(RecentActivityState {
            limit,
            ..RecentActivityState::default()
        });
        Self {
            repo,
            session,
            notifier,
            state,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<RecentActivityState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> RecentActivityState {
        self.state.borrow().clone()
    }

    pub async fn activate(&self) {
        if self.state.borrow().status == LoadStatus::Idle {
            self.reload().await;
        }
    }

    /// Change the feed length; reloads only when it actually changed.
    pub async fn set_limit(&self, limit: usize) {
        let changed = self.state.send_if_modified(|s| {
            if s.limit == limit {
                return false;
            }
            s.limit = limit;
            true
        });
        if changed {
            self.reload().await;
        }
    }

    /// Fetch the feed for the current limit. A reload superseded by a later
    /// one (for example after another `set_limit`) drops its results and
    /// returns `false`.
    pub async fn reload(&self) -> bool {
        let mut request = 0;
        let mut limit = 0;
        self.state.send_modify(|s| {
            s.request += 1;
            request = s.request;
            limit = s.limit;
            s.status = LoadStatus::Loading;
        });

        let mut failures = Vec::new();
        let activities = settle(
            self.repo.list_recent_activities(&self.session, limit).await,
            "Failed to load recent activities",
            &mut failures,
        );

        let applied = self.state.send_if_modified(|s| {
            if s.request != request {
                return false;
            }
            s.activities = activities;
            s.status = LoadStatus::Ready;
            true
        });

        if applied {
            for failure in failures {
                self.notifier.notify(failure);
            }
        } else {
            tracing::debug!("Dropping stale activity feed for limit {}", limit);
        }
        applied
    }
}
