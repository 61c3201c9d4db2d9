//! Stores that sit between the data operations and whatever renders them.
//! Each owns one slice of data plus its load status, published through a
//! `watch` channel so a view can re-render on change.

mod activity;
mod subject_content;
mod subjects;

pub use activity::{RecentActivityState, RecentActivityStore};
pub use subject_content::{SubjectContentState, SubjectContentStore};
pub use subjects::{SubjectsState, SubjectsStore};

use tokio::sync::mpsc;

use crate::error::{AppError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadStatus {
    #[default]
    Idle,
    Loading,
    Ready,
}

/// A transient, user-facing message about a failed load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub title: String,
    pub description: String,
}

/// Side channel for failures. Stores keep rendering empty data either way.
#[derive(Clone, Default)]
pub struct Notifier {
    tx: Option<mpsc::UnboundedSender<Notice>>,
}

impl Notifier {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Notice>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx: Some(tx) }, rx)
    }

    pub fn silent() -> Self {
        Self { tx: None }
    }

    pub fn notify(&self, description: impl Into<String>) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(Notice {
                title: "Error".to_string(),
                description: description.into(),
            });
        }
    }
}

/// Collapse a load result to its value or the empty default, remembering the
/// failure message for the caller to publish.
fn settle<T: Default>(result: Result<T>, description: &str, failures: &mut Vec<String>) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            log_load_failure(description, &e);
            failures.push(description.to_string());
            T::default()
        }
    }
}

fn log_load_failure(description: &str, error: &AppError) {
    if error.is_expected() {
        tracing::warn!("{}: {}", description, error);
    } else {
        tracing::error!("{}: {}", description, error);
    }
}
