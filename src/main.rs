use std::path::PathBuf;

use chrono::{NaiveDateTime, NaiveTime};
use clap::{ArgGroup, Parser, Subcommand};

mod classify;
mod db;
mod models;
mod report;
mod summary;

#[derive(Parser)]
#[command(name = "attendance-insights")]
#[command(about = "QR attendance rating and streak tracker", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database schema if it does not exist
    InitDb,
    /// Load realistic seed data
    Seed,
    /// Register a member so their QR code is accepted
    AddMember {
        /// QR payload identifying the member
        #[arg(long)]
        user_id: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        group: String,
    },
    /// List registered members
    ListMembers,
    /// Record one decoded QR scan
    Scan {
        /// QR payload identifying the member
        user_id: String,
        /// Scan timestamp, e.g. 2026-03-02T07:45:00
        #[arg(long)]
        at: NaiveDateTime,
        #[arg(long, default_value_t = classify::DEFAULT_CUTOFF)]
        cutoff: NaiveTime,
    },
    /// Import historical events from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
        #[arg(long, default_value_t = classify::DEFAULT_CUTOFF)]
        cutoff: NaiveTime,
    },
    /// Rate members by attendance history
    #[command(group(
        ArgGroup::new("scope")
            .args(["user_id", "group"])
            .multiple(false)
    ))]
    Rate {
        #[arg(long)]
        user_id: Option<String>,
        #[arg(long)]
        group: Option<String>,
        #[arg(long, default_value_t = 10)]
        limit: usize,
        #[arg(long)]
        json: bool,
    },
    /// Generate a markdown report
    #[command(group(
        ArgGroup::new("scope")
            .args(["user_id", "group"])
            .multiple(false)
    ))]
    Report {
        #[arg(long)]
        user_id: Option<String>,
        #[arg(long)]
        group: Option<String>,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:attendance.db".to_string());

    let pool = db::connect(&database_url).await?;

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            db::init_db(&pool).await?;
            db::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::AddMember {
            user_id,
            name,
            group,
        } => {
            let member = models::Member {
                user_id,
                name,
                group_name: group,
            };
            if db::add_member(&pool, &member).await? {
                println!("Added {} ({}).", member.name, member.user_id);
            } else {
                println!("User ID {} is already registered.", member.user_id);
            }
        }
        Commands::ListMembers => {
            let members = db::list_members(&pool).await?;
            if members.is_empty() {
                println!("No members registered yet.");
            } else {
                for member in members {
                    println!("- {} ({}, {})", member.name, member.user_id, member.group_name);
                }
            }
        }
        Commands::Scan {
            user_id,
            at,
            cutoff,
        } => match db::record_scan(&pool, &user_id, at, cutoff).await? {
            db::ScanOutcome::Recorded {
                member,
                status,
                time_in,
            } => {
                println!(
                    "{} ({}) recorded as {} at {}.",
                    member.name,
                    member.group_name,
                    status.as_label(),
                    time_in
                );
            }
            db::ScanOutcome::DuplicateScan { member } => {
                println!("{} already scanned on {}.", member.name, at.date());
            }
            db::ScanOutcome::UnknownMember => {
                println!("No registered member matches QR payload {user_id}.");
            }
        },
        Commands::Import { csv, cutoff } => {
            let outcome = db::import_csv(&pool, &csv, cutoff).await?;
            println!(
                "Inserted {} events from {} ({} duplicates skipped).",
                outcome.inserted,
                csv.display(),
                outcome.skipped
            );
        }
        Commands::Rate {
            user_id,
            group,
            limit,
            json,
        } => {
            let events = db::fetch_events(&pool, user_id.as_deref(), group.as_deref()).await?;
            let summaries = summary::summarize_all(&events);

            if summaries.is_empty() {
                println!("No attendance recorded for this scope yet.");
                return Ok(());
            }

            if json {
                let payload: Vec<_> = summaries.iter().take(limit).collect();
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                println!("Members by attendance rating:");
                for summary in summaries.iter().take(limit) {
                    println!(
                        "- {} ({}, {}) mean {:.2} tier {} streak {} across {} events",
                        summary.subject_name,
                        summary.subject_id,
                        summary.group_name,
                        summary.mean_score,
                        summary.tier.as_label(),
                        summary.longest_on_time_streak,
                        summary.event_count
                    );
                }
            }
        }
        Commands::Report {
            user_id,
            group,
            out,
        } => {
            let events = db::fetch_events(&pool, user_id.as_deref(), group.as_deref()).await?;
            let scope = user_id.as_deref().or(group.as_deref());
            let report = report::build_report(scope, &events);
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}
