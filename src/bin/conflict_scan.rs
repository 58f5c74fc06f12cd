//! Reports double-booked teachers across all active classes.

use std::sync::Arc;

use clap::Parser;
use sqlx::sqlite::SqlitePoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use class_scheduler::config::AppConfig;
use class_scheduler::db::SqliteClassStore;
use class_scheduler::models::Severity;
use class_scheduler::services::SchedulingService;

#[derive(Debug, Parser)]
struct Args {
    /// Only scan the classes of this teacher
    #[arg(long)]
    teacher: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "class_scheduler=warn".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::new_from_env()?;
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect(&config.database_url)
        .await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let service = SchedulingService::new(
        Arc::new(SqliteClassStore::new(pool)),
        config.default_duration_minutes,
    );

    let alerts = match args.teacher {
        Some(teacher_id) => service.teacher_conflicts(&teacher_id).await?,
        None => service.all_conflicts().await?,
    };

    if alerts.is_empty() {
        println!("No conflicts found");
        return Ok(());
    }

    let mut current_teacher = "";
    for alert in &alerts {
        if alert.teacher_id != current_teacher {
            current_teacher = alert.teacher_id.as_str();
            println!("\nTeacher {}", current_teacher);
        }
        let tag = match alert.severity {
            Severity::High => "HIGH",
            Severity::Medium => "MEDIUM",
        };
        println!("  [{}] {}", tag, alert.message);
    }

    let high = alerts.iter().filter(|a| a.severity == Severity::High).count();
    println!(
        "\nConflicts: {} ({} high, {} medium)",
        alerts.len(),
        high,
        alerts.len() - high
    );

    Ok(())
}
