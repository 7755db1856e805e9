use std::str::FromStr;

use anyhow::Context;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;

use crate::classify;
use crate::models::{AttendanceEvent, Member, Status};

pub async fn connect(database_url: &str) -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)
        .with_context(|| format!("invalid database URL {database_url}"))?
        .create_if_missing(true);

    SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
        .context("failed to open the attendance database")
}

pub async fn init_db(pool: &SqlitePool) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS members (
            user_id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            group_name TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // The composite key is what rejects a second scan on the same date.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS attendance (
            user_id TEXT NOT NULL REFERENCES members(user_id),
            date TEXT NOT NULL,
            time_in TEXT,
            status TEXT NOT NULL,
            PRIMARY KEY (user_id, date)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Inserts a member; returns false when the user id is already registered.
pub async fn add_member(pool: &SqlitePool, member: &Member) -> anyhow::Result<bool> {
    let result = sqlx::query(
        "INSERT INTO members (user_id, name, group_name) VALUES (?, ?, ?) \
         ON CONFLICT (user_id) DO NOTHING",
    )
    .bind(&member.user_id)
    .bind(&member.name)
    .bind(&member.group_name)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn list_members(pool: &SqlitePool) -> anyhow::Result<Vec<Member>> {
    let rows = sqlx::query("SELECT user_id, name, group_name FROM members ORDER BY name")
        .fetch_all(pool)
        .await?;

    Ok(rows
        .into_iter()
        .map(|row| Member {
            user_id: row.get("user_id"),
            name: row.get("name"),
            group_name: row.get("group_name"),
        })
        .collect())
}

#[derive(Debug)]
pub enum ScanOutcome {
    Recorded {
        member: Member,
        status: Status,
        time_in: NaiveTime,
    },
    /// The member already scanned on this date; the earlier row wins.
    DuplicateScan { member: Member },
    UnknownMember,
}

/// Records one decoded QR scan. The scan timestamp is an explicit argument
/// so classification never depends on an ambient clock.
pub async fn record_scan(
    pool: &SqlitePool,
    user_id: &str,
    scanned_at: NaiveDateTime,
    cutoff: NaiveTime,
) -> anyhow::Result<ScanOutcome> {
    let member = match fetch_member(pool, user_id).await? {
        Some(member) => member,
        None => return Ok(ScanOutcome::UnknownMember),
    };

    let time_in = scanned_at.time();
    let status = classify::classify_by_cutoff(time_in, cutoff);

    let result = sqlx::query(
        "INSERT INTO attendance (user_id, date, time_in, status) VALUES (?, ?, ?, ?) \
         ON CONFLICT (user_id, date) DO NOTHING",
    )
    .bind(user_id)
    .bind(scanned_at.date())
    .bind(time_in)
    .bind(status.as_label())
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        Ok(ScanOutcome::DuplicateScan { member })
    } else {
        Ok(ScanOutcome::Recorded {
            member,
            status,
            time_in,
        })
    }
}

async fn fetch_member(pool: &SqlitePool, user_id: &str) -> anyhow::Result<Option<Member>> {
    let row = sqlx::query("SELECT user_id, name, group_name FROM members WHERE user_id = ?")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

    Ok(row.map(|row| Member {
        user_id: row.get("user_id"),
        name: row.get("name"),
        group_name: row.get("group_name"),
    }))
}

#[derive(Debug, Default)]
pub struct ImportOutcome {
    pub inserted: usize,
    pub skipped: usize,
}

/// Imports historical events from a CSV export. Rows carrying a status label
/// keep it verbatim (normalization happens at read time); rows carrying only
/// a check-in time are classified against the cutoff.
pub async fn import_csv(
    pool: &SqlitePool,
    csv_path: &std::path::Path,
    cutoff: NaiveTime,
) -> anyhow::Result<ImportOutcome> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        user_id: String,
        name: String,
        group_name: String,
        date: NaiveDate,
        time_in: Option<NaiveTime>,
        status: Option<String>,
    }

    let mut reader = csv::Reader::from_path(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    let mut outcome = ImportOutcome::default();

    for (index, result) in reader.deserialize::<CsvRow>().enumerate() {
        let row = result.with_context(|| format!("malformed CSV record {}", index + 1))?;

        let status_label = match (row.status.as_deref().map(str::trim), row.time_in) {
            (Some(label), _) if !label.is_empty() => label.to_string(),
            (_, Some(time_in)) => classify::classify_by_cutoff(time_in, cutoff)
                .as_label()
                .to_string(),
            _ => anyhow::bail!(
                "CSV record {} for {} has neither a status nor a check-in time",
                index + 1,
                row.user_id
            ),
        };

        sqlx::query(
            "INSERT INTO members (user_id, name, group_name) VALUES (?, ?, ?) \
             ON CONFLICT (user_id) DO UPDATE \
             SET name = excluded.name, group_name = excluded.group_name",
        )
        .bind(&row.user_id)
        .bind(&row.name)
        .bind(&row.group_name)
        .execute(pool)
        .await?;

        let result = sqlx::query(
            "INSERT INTO attendance (user_id, date, time_in, status) VALUES (?, ?, ?, ?) \
             ON CONFLICT (user_id, date) DO NOTHING",
        )
        .bind(&row.user_id)
        .bind(row.date)
        .bind(row.time_in)
        .bind(&status_label)
        .execute(pool)
        .await?;

        if result.rows_affected() > 0 {
            outcome.inserted += 1;
        } else {
            outcome.skipped += 1;
        }
    }

    Ok(outcome)
}

/// Fetches events ordered by subject then date ascending. The aggregator
/// requires date-ascending input per subject; this query is where that
/// obligation is discharged.
pub async fn fetch_events(
    pool: &SqlitePool,
    user_id: Option<&str>,
    group: Option<&str>,
) -> anyhow::Result<Vec<AttendanceEvent>> {
    let mut query = String::from(
        "SELECT a.user_id, m.name, m.group_name, a.date, a.time_in, a.status \
         FROM attendance a \
         JOIN members m ON m.user_id = a.user_id",
    );

    if user_id.is_some() {
        query.push_str(" WHERE a.user_id = ?");
    } else if group.is_some() {
        query.push_str(" WHERE m.group_name = ?");
    }
    query.push_str(" ORDER BY a.user_id, a.date ASC");

    let mut rows = sqlx::query(&query);
    if let Some(value) = user_id {
        rows = rows.bind(value);
    } else if let Some(value) = group {
        rows = rows.bind(value);
    }

    let records = rows.fetch_all(pool).await?;
    let mut events = Vec::with_capacity(records.len());

    for row in records {
        let label: String = row.get("status");
        events.push(AttendanceEvent {
            subject_id: row.get("user_id"),
            subject_name: row.get("name"),
            group_name: row.get("group_name"),
            date: row.get("date"),
            time_in: row.get("time_in"),
            status: Status::from_label(&label),
        });
    }

    Ok(events)
}

pub async fn seed(pool: &SqlitePool) -> anyhow::Result<()> {
    let members = vec![
        ("stu-014", "Avery Lee", "Section A"),
        ("stu-022", "Jules Moreno", "Section A"),
        ("stu-031", "Kiara Patel", "Section B"),
    ];

    for (user_id, name, group_name) in members {
        sqlx::query(
            "INSERT INTO members (user_id, name, group_name) VALUES (?, ?, ?) \
             ON CONFLICT (user_id) DO UPDATE \
             SET name = excluded.name, group_name = excluded.group_name",
        )
        .bind(user_id)
        .bind(name)
        .bind(group_name)
        .execute(pool)
        .await?;
    }

    let events = vec![
        ("stu-014", 2, "07:45:00", "On Time"),
        ("stu-014", 3, "07:52:00", "On Time"),
        ("stu-014", 4, "08:20:00", "Late"),
        ("stu-022", 2, "07:58:00", "On Time"),
        ("stu-022", 3, "", "Absent"),
        ("stu-022", 4, "08:05:00", "Late"),
        ("stu-031", 2, "07:30:00", "On Time"),
        ("stu-031", 3, "07:40:00", "On Time"),
        ("stu-031", 4, "07:35:00", "On Time"),
    ];

    for (user_id, day, time_in, status) in events {
        let date = NaiveDate::from_ymd_opt(2026, 3, day).context("invalid seed date")?;
        let time_in = if time_in.is_empty() {
            None
        } else {
            Some(NaiveTime::from_str(time_in).context("invalid seed time")?)
        };

        sqlx::query(
            "INSERT INTO attendance (user_id, date, time_in, status) VALUES (?, ?, ?, ?) \
             ON CONFLICT (user_id, date) DO NOTHING",
        )
        .bind(user_id)
        .bind(date)
        .bind(time_in)
        .bind(status)
        .execute(pool)
        .await?;
    }

    Ok(())
}
