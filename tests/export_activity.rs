mod common;

use study_dashboard::export::export_activities;

use common::{signed_in, USER_ID};

#[tokio::test]
async fn exported_feed_matches_recent_activity() {
    let fx = signed_in().await;
    fx.subject(1, "History, Modern");
    fx.quiz(10, 1, "Cold War");
    fx.attempt(USER_ID, 10, 88.0, "2024-05-01T09:30:00+00:00");
    fx.attempt(USER_ID, 404, 40.0, "2024-04-01T08:00:00+00:00");

    let activities = fx.api().list_recent_activities(5).await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out").join("activity.csv");

    let written = export_activities(&path, &activities).unwrap();
    assert_eq!(written, 2);

    let csv = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(
        lines,
        vec![
            "type,subject,title,timestamp,score",
            "quiz,\"History, Modern\",Cold War,2024-05-01 09:30:00,88",
            "quiz,Unknown Subject,Unknown Quiz,2024-04-01 08:00:00,40",
        ]
    );
}
