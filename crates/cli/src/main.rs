//! FitSync CLI - demo driver for the reminder and challenge core.

use anyhow::Result;
use chrono::{Duration, Utc};
use clap::{Parser, Subcommand};
use tracing::{info, Level};

use fitsync_challenge::{create_challenge, join, ChallengeProgressEngine, ChallengeSpec};
use fitsync_core::{
    ChallengeCategory, ChallengeGoal, Frequency, QuietHours, Recurrence, ReminderKind,
    ReminderSettings, UserId,
};
use fitsync_scheduler::{
    AdherenceLog, DoseOutcome, PastDuePolicy, ReminderScheduler, ReminderSpec,
};
use fitsync_storage::{MemoryStorage, Storage};

#[derive(Parser)]
#[command(name = "fitsync")]
#[command(about = "Fitness reminder and challenge core demo", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Schedule a reminder and print the notification when it fires
    Remind {
        /// Reminder title
        #[arg(long, default_value = "Hydration check")]
        title: String,
        /// Seconds until the reminder fires
        #[arg(long, default_value = "3")]
        after: u64,
        /// Repeat daily
        #[arg(long)]
        daily: bool,
        /// Quiet hours window, e.g. "22:00-07:00"
        #[arg(long)]
        quiet: Option<String>,
    },
    /// Seed a demo challenge, drive goal updates, and print the leaderboard
    Challenge,
    /// Replay a demo dose history and print adherence stats
    Adherence,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Remind {
            title,
            after,
            daily,
            quiet,
        } => run_remind(title, after, daily, quiet).await?,
        Commands::Challenge => run_challenge().await?,
        Commands::Adherence => run_adherence(),
    }

    Ok(())
}

async fn run_remind(title: String, after: u64, daily: bool, quiet: Option<String>) -> Result<()> {
    let mut settings = ReminderSettings::default();
    if let Some(window) = quiet {
        let (start, end) = window
            .split_once('-')
            .ok_or_else(|| anyhow::anyhow!("quiet hours must look like 22:00-07:00"))?;
        settings.quiet_hours = Some(QuietHours::parse(start, end)?);
    }

    let (scheduler, mut notifications) =
        ReminderScheduler::spawn(settings, PastDuePolicy::FireImmediately);

    let mut spec = ReminderSpec::new(
        UserId::new("demo"),
        title,
        "Scheduled from the fitsync CLI",
        ReminderKind::Custom,
        Utc::now() + Duration::seconds(after as i64),
    );
    if daily {
        spec = spec.with_recurrence(Recurrence::new(Frequency::Daily, 1));
    }

    let reminder = scheduler.schedule(spec).await;
    info!("scheduled reminder {} for {}", reminder.id, reminder.scheduled_at);

    let wait = std::time::Duration::from_secs(after + 5);
    match tokio::time::timeout(wait, notifications.recv()).await {
        Ok(Some(notification)) => {
            println!(
                "[{}] {} - {} (priority {:?}, sound: {}, vibration: {})",
                notification.kind.as_str(),
                notification.title,
                notification.message,
                notification.priority,
                notification.sound,
                notification.vibration,
            );
            if let Some(stored) = scheduler.get(reminder.id).await {
                if let Some(next) = stored.recurrence.map(|_| stored.scheduled_at) {
                    println!("next occurrence: {next}");
                }
            }
        }
        Ok(None) => println!("notification channel closed"),
        Err(_) => println!("no delivery (suppressed by quiet hours?)"),
    }

    scheduler.cleanup().await;
    Ok(())
}

async fn run_challenge() -> Result<()> {
    let mut storage = MemoryStorage::new().with_latency(std::time::Duration::from_millis(25));

    let spec = ChallengeSpec {
        name: "Spring Steps".to_string(),
        description: "Hit 10k steps and 5 workouts".to_string(),
        category: ChallengeCategory::Steps,
        starts_at: Utc::now(),
        ends_at: Utc::now() + Duration::days(30),
        goals: vec![
            ChallengeGoal::new(10_000.0, "steps"),
            ChallengeGoal::new(5.0, "workouts"),
        ],
        max_members: 10,
    };

    let mut challenge = create_challenge(spec, UserId::new("alice"), "Alice", Utc::now())?;
    let bob = join(&mut challenge, UserId::new("bob"), "Bob", Utc::now())?;
    let cara = join(&mut challenge, UserId::new("cara"), "Cara", Utc::now())?;

    let engine = ChallengeProgressEngine;
    let alice = challenge.members[0].id;
    let steps = challenge.goals[0].id;
    let workouts = challenge.goals[1].id;

    engine.update_goal_progress(&mut challenge, alice, steps, 8_500.0)?;
    engine.update_goal_progress(&mut challenge, bob, workouts, 5.0)?;
    engine.update_goal_progress(&mut challenge, cara, steps, 10_000.0)?;

    let board = engine.recompute_leaderboard(&mut challenge);
    storage.save_challenge(&challenge).await?;

    println!("Leaderboard: {} ({})", challenge.name, challenge.category.as_str());
    for entry in &board {
        println!(
            "  #{} {} - {}% (score {})",
            entry.rank, entry.display_name, entry.progress, entry.score
        );
    }

    let stored = storage
        .load_challenge(challenge.id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("challenge vanished from storage"))?;
    info!(
        "persisted challenge {} with {} members",
        stored.id,
        stored.members.len()
    );

    Ok(())
}

fn run_adherence() {
    use fitsync_core::ReminderId;

    let mut log = AdherenceLog::new();
    let aspirin = ReminderId::new();
    let now = Utc::now();

    for days_ago in 1..=7 {
        let due = now - Duration::days(days_ago);
        let outcome = match days_ago {
            3 => DoseOutcome::Missed,
            6 => DoseOutcome::Skipped,
            _ => DoseOutcome::Taken,
        };
        log.record(aspirin, due, outcome, due + Duration::minutes(5));
    }

    let stats = log.stats(None);
    println!("Doses: {} total", stats.total);
    println!("  taken: {}, missed: {}, skipped: {}", stats.taken, stats.missed, stats.skipped);
    match stats.rate {
        Some(rate) => println!("  adherence rate: {:.0}%", rate * 100.0),
        None => println!("  adherence rate: n/a"),
    }
}
