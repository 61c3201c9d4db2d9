use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Quiz,
}

impl ActivityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityKind::Quiz => "quiz",
        }
    }
}

/// One row of the activity feed: an attempt joined with its quiz and subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentActivity {
    pub kind: ActivityKind,
    pub subject: String,
    pub title: String,
    pub completed_at: DateTime<Utc>,
    pub score: f64,
}
