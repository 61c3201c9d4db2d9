use std::path::PathBuf;
use std::sync::Arc;

use study_dashboard::backend::{MemoryBackend, RemoteBackend, RestBackend};
use study_dashboard::models::option_label;
use study_dashboard::sync::{Notifier, RecentActivityStore, SubjectContentStore, SubjectsStore};
use study_dashboard::{demo, export, AppError, Config, DashboardApi, Repository, Result, Session};

const USAGE: &str = "usage: study-dashboard [--demo] <subjects | subject <id> | quiz <id> | \
activity [limit] | export-activity <path> | settings | toggle-subject <id> | profile>";

fn parse_id(arg: Option<&String>) -> Result<i64> {
    arg.and_then(|s| s.parse().ok())
        .ok_or_else(|| AppError::Config(USAGE.to_string()))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging (only show warnings and errors by default)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut args: Vec<String> = std::env::args().skip(1).collect();

    // Check for --demo flag (in-memory sample data)
    let demo_mode = if let Some(pos) = args.iter().position(|a| a == "--demo") {
        args.remove(pos);
        true
    } else {
        false
    };

    let config = Config::load()?;

    let (backend, token): (Arc<dyn RemoteBackend>, Option<String>) = if demo_mode {
        let memory = MemoryBackend::new();
        let token = demo::seed(&memory).to_string();
        (Arc::new(memory), Some(token))
    } else {
        (
            Arc::new(RestBackend::new(&config)?),
            config.access_token.clone(),
        )
    };

    let session = Session::resolve(backend.as_ref(), token.as_deref()).await;
    let repo = Repository::new(backend, config.avatar_bucket.clone());
    let api = DashboardApi::new(repo.clone(), session.clone());
    let (notifier, mut notices) = Notifier::channel();

    let Some(command) = args.first() else {
        eprintln!("{}", USAGE);
        return Ok(());
    };

    match command.as_str() {
        "subjects" => {
            let store = SubjectsStore::new(repo, session, notifier).with_progress();
            store.activate().await;
            let state = store.snapshot();
            if state.subjects.is_empty() {
                println!("No subjects yet.");
            }
            for subject in state.subjects {
                println!(
                    "{:>4}  {:<24} {:>3}%  [{}]",
                    subject.id,
                    subject.title,
                    subject.progress,
                    subject.icon.key()
                );
            }
        }

        "subject" => {
            let id = parse_id(args.get(1))?;
            let store = SubjectContentStore::new(repo, notifier);
            store.select_subject(id).await;
            let state = store.snapshot();

            println!("Quizzes:");
            if state.quizzes.is_empty() {
                println!("  (none)");
            }
            for quiz in &state.quizzes {
                println!("  {:>4}  {} ({} min)", quiz.id, quiz.title, quiz.time_minutes);
            }
            println!("Flashcards:");
            if state.flashcards.is_empty() {
                println!("  (none)");
            }
            for card in &state.flashcards {
                println!("  Q: {}\n  A: {}", card.question, card.answer);
            }
            for note in api.list_notes_by_subject(id).await {
                println!("Note: {} - {}", note.title, note.content);
            }
        }

        "quiz" => {
            let id = parse_id(args.get(1))?;
            let Some(quiz) = api.get_quiz(id).await else {
                println!("Quiz {} not found.", id);
                return Ok(());
            };
            let questions = api.list_quiz_questions(id).await;
            println!("{} ({} min, {} questions)", quiz.title, quiz.time_minutes, questions.len());
            for (n, question) in questions.iter().enumerate() {
                println!("{}. {}", n + 1, question.question);
                for (label, option) in question.labeled_options() {
                    println!("   {}. {}", label, option);
                }
                if let Some(idx) = question.correct_index {
                    println!("   answer: {}", option_label(idx));
                }
            }
        }

        "activity" => {
            let limit = match args.get(1) {
                Some(s) => s
                    .parse()
                    .map_err(|_| AppError::Config(USAGE.to_string()))?,
                None => config.recent_activity_limit,
            };
            let store = RecentActivityStore::new(repo, session, notifier, limit);
            store.activate().await;
            let state = store.snapshot();
            if state.activities.is_empty() {
                println!("No recent activity.");
            }
            for activity in state.activities {
                println!(
                    "{}  {:<16} {:<24} {:>5}",
                    activity.completed_at.format("%Y-%m-%d %H:%M"),
                    activity.subject,
                    activity.title,
                    activity.score
                );
            }
        }

        "export-activity" => {
            let Some(path) = args.get(1).map(PathBuf::from) else {
                eprintln!("{}", USAGE);
                return Ok(());
            };
            let activities = api
                .list_recent_activities(config.recent_activity_limit)
                .await;
            let count = export::export_activities(&path, &activities)?;
            println!("Exported {} activities to {:?}", count, path);
        }

        "settings" => match api.get_quiz_settings().await {
            Some(settings) => {
                println!("difficulty:    {}", settings.difficulty.as_str());
                println!("session:       {} min", settings.time_preference_minutes);
                println!("notifications: {}", settings.notifications_enabled);
                println!("subjects:      {:?}", settings.preferred_subject_ids);
            }
            None => println!("No quiz settings saved."),
        },

        "toggle-subject" => {
            let id = parse_id(args.get(1))?;
            match api.toggle_preferred_subject(id).await {
                Some(ids) => println!("Preferred subjects: {:?}", ids),
                None => println!("Could not update preferences."),
            }
        }

        "profile" => match api.get_profile().await {
            Some(profile) => {
                println!("{}", profile.full_name);
                if let Some(email) = profile.email {
                    println!("{}", email);
                }
                if let Some(url) = profile.avatar_url {
                    println!("avatar: {}", url);
                }
            }
            None => println!("Not signed in."),
        },

        _ => eprintln!("{}", USAGE),
    }

    while let Ok(notice) = notices.try_recv() {
        eprintln!("{}: {}", notice.title, notice.description);
    }

    Ok(())
}
