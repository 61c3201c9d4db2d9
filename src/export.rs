use std::path::Path;

use crate::error::Result;
use crate::models::RecentActivity;

const HEADER: &str = "type,subject,title,timestamp,score\n";

fn csv_quote(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

pub fn activities_to_csv(activities: &[RecentActivity]) -> String {
    let mut csv = String::from(HEADER);
    for activity in activities {
        csv.push_str(&format!(
            "{},{},{},{},{}\n",
            activity.kind.as_str(),
            csv_quote(&activity.subject),
            csv_quote(&activity.title),
            activity.completed_at.format("%Y-%m-%d %H:%M:%S"),
            activity.score
        ));
    }
    csv
}

/// Write the feed to `path`, creating parent directories as needed.
pub fn export_activities(path: &Path, activities: &[RecentActivity]) -> Result<usize> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, activities_to_csv(activities))?;
    tracing::info!("Exported {} activities to {:?}", activities.len(), path);
    Ok(activities.len())
}
