use std::fmt::Write;

use chrono::NaiveDate;

use crate::models::{AttendanceEvent, Status};
use crate::summary;

pub fn summarize_status_mix(events: &[AttendanceEvent]) -> Vec<(Status, usize)> {
    let buckets = [
        Status::OnTime,
        Status::Late,
        Status::Absent,
        Status::Unrecognized,
    ];

    let mut mix: Vec<(Status, usize)> = buckets
        .into_iter()
        .map(|status| (status, events.iter().filter(|e| e.status == status).count()))
        .filter(|(_, count)| *count > 0)
        .collect();

    mix.sort_by(|a, b| b.1.cmp(&a.1));
    mix
}

/// Counts events per calendar date, ascending.
pub fn summarize_daily_scans(events: &[AttendanceEvent]) -> Vec<(NaiveDate, usize)> {
    let mut counts: std::collections::BTreeMap<NaiveDate, usize> =
        std::collections::BTreeMap::new();

    for event in events {
        *counts.entry(event.date).or_insert(0) += 1;
    }

    counts.into_iter().collect()
}

pub fn build_report(scope: Option<&str>, events: &[AttendanceEvent]) -> String {
    let summaries = summary::summarize_all(events);
    let mix = summarize_status_mix(events);
    let daily = summarize_daily_scans(events);

    let mut output = String::new();
    let scope_label = scope.unwrap_or("all members");

    let _ = writeln!(output, "# Attendance Rating Report");
    let _ = writeln!(
        output,
        "Generated for {} ({} events across {} members)",
        scope_label,
        events.len(),
        summaries.len()
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Status Mix");

    if mix.is_empty() {
        let _ = writeln!(output, "No attendance recorded yet.");
    } else {
        for (status, count) in mix.iter() {
            let _ = writeln!(output, "- {}: {} events", status.as_label(), count);
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Daily Scans");

    if daily.is_empty() {
        let _ = writeln!(output, "No attendance recorded yet.");
    } else {
        for (date, count) in daily.iter() {
            let _ = writeln!(output, "- {date}: {count} events");
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Member Ratings");

    if summaries.is_empty() {
        let _ = writeln!(output, "No members with attendance in this scope.");
    } else {
        for summary in summaries.iter() {
            let _ = writeln!(
                output,
                "- {} ({}, {}): mean {:.2}, tier {}, longest on-time streak {} across {} events",
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

    let _ = writeln!(output);
    let _ = writeln!(output, "## Follow-up Alerts");

    let alerts: Vec<_> = summaries
        .iter()
        .filter_map(|s| s.latest_alert.map(|alert| (s, alert)))
        .collect();

    if alerts.is_empty() {
        let _ = writeln!(output, "No members need follow-up.");
    } else {
        for (summary, alert) in alerts {
            let _ = writeln!(
                output,
                "- {} ({}): {}",
                summary.subject_name,
                summary.group_name,
                alert.as_label()
            );
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn event(subject_id: &str, day: u32, status: Status) -> AttendanceEvent {
        AttendanceEvent {
            subject_id: subject_id.to_string(),
            subject_name: format!("Member {subject_id}"),
            group_name: "Section A".to_string(),
            date: NaiveDate::from_ymd_opt(2026, 3, day).unwrap(),
            time_in: None,
            status,
        }
    }

    #[test]
    fn report_flags_members_whose_latest_status_slipped() {
        let events = vec![
            event("stu-014", 2, Status::OnTime),
            event("stu-014", 3, Status::Late),
            event("stu-022", 2, Status::Late),
            event("stu-022", 3, Status::OnTime),
        ];

        let report = build_report(Some("Section A"), &events);
        assert!(report.contains("Generated for Section A"));
        assert!(report.contains("- Member stu-014 (Section A): late at last session"));
        assert!(!report.contains("Member stu-022 (Section A): late"));
    }

    #[test]
    fn empty_scope_renders_placeholders_instead_of_failing() {
        let report = build_report(None, &[]);
        assert!(report.contains("Generated for all members (0 events across 0 members)"));
        assert!(report.contains("No attendance recorded yet."));
        assert!(report.contains("No members with attendance in this scope."));
        assert!(report.contains("No members need follow-up."));
    }

    #[test]
    fn daily_scans_count_events_per_date_ascending() {
        let events = vec![
            event("stu-022", 3, Status::Late),
            event("stu-014", 2, Status::OnTime),
            event("stu-022", 2, Status::OnTime),
        ];

        let daily = summarize_daily_scans(&events);
        assert_eq!(
            daily,
            vec![
                (NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(), 2),
                (NaiveDate::from_ymd_opt(2026, 3, 3).unwrap(), 1),
            ]
        );

        let report = build_report(None, &events);
        assert!(report.contains("## Daily Scans"));
        assert!(report.contains("- 2026-03-02: 2 events"));
        assert!(report.contains("- 2026-03-03: 1 events"));
    }

    #[test]
    fn status_mix_counts_and_ranks_labels() {
        let events = vec![
            event("stu-014", 2, Status::OnTime),
            event("stu-014", 3, Status::OnTime),
            event("stu-014", 4, Status::Absent),
        ];

        let mix = summarize_status_mix(&events);
        assert_eq!(mix, vec![(Status::OnTime, 2), (Status::Absent, 1)]);
    }
}
