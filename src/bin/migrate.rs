//! Applies pending schema migrations to the attendance database.
//!
//! Run it while the server is stopped; the server refuses to start on an
//! outdated schema.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use teacher_attendance::config::{DEFAULT_BACKUP_PATH, DEFAULT_DATABASE_URL};
use teacher_attendance::migrate::{self, LATEST_VERSION};

#[derive(Parser, Debug)]
#[command(name = "migrate", version, about = "Migrate the attendance database to the current schema")]
struct Cli {
    /// Database file or sqlite:// URL
    #[arg(long, env = "DATABASE_URL", default_value = DEFAULT_DATABASE_URL)]
    database: String,

    /// Where to copy the database before migrating
    #[arg(long, env = "BACKUP_PATH", default_value = DEFAULT_BACKUP_PATH)]
    backup: PathBuf,

    /// Only report the current and target schema version
    #[arg(long)]
    status: bool,
}

#[actix_web::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let db_path = migrate::database_path(&cli.database);

    if cli.status {
        return match migrate::status(&db_path).await {
            Ok(version) => {
                println!(
                    "{}: schema version {version}, target {LATEST_VERSION}",
                    db_path.display()
                );
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("Error: {e:#}");
                ExitCode::FAILURE
            }
        };
    }

    match migrate::run(&db_path, &cli.backup).await {
        Ok(report) if report.applied.is_empty() => {
            println!("Database already at schema version {}", report.to_version);
            ExitCode::SUCCESS
        }
        Ok(report) => {
            println!(
                "Migrated {} from version {} to {}",
                db_path.display(),
                report.from_version,
                report.to_version
            );
            if let Some(backup) = report.backup {
                println!("A backup of the previous database is at {}", backup.display());
            }
            println!("Please restart the application.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error during migration: {e:#}");
            ExitCode::FAILURE
        }
    }
}
