use thiserror::Error;

use crate::classify::rating_score;
use crate::models::{Alert, AttendanceEvent, RatingSummary, Status, Tier};

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum HistoryError {
    /// A subject with zero recorded events has no meaningful rating; failing
    /// fast beats reporting a fake "Poor" tier for someone never seen.
    #[error("subject has no recorded attendance events")]
    EmptyHistory,
}

/// Arithmetic mean of rating scores across one subject's events. The result
/// is unrounded; presentation rounding belongs to the caller.
pub fn mean_rating(statuses: &[Status]) -> Result<f64, HistoryError> {
    if statuses.is_empty() {
        return Err(HistoryError::EmptyHistory);
    }
    let total: u32 = statuses.iter().map(|s| rating_score(*s)).sum();
    Ok(f64::from(total) / statuses.len() as f64)
}

/// Threshold ladder, evaluated top-down with inclusive lower bounds: a mean
/// of exactly 2.5, 1.8 or 1.0 lands in the higher tier.
pub fn rating_tier(mean_score: f64) -> Tier {
    if mean_score >= 2.5 {
        Tier::Excellent
    } else if mean_score >= 1.8 {
        Tier::Good
    } else if mean_score >= 1.0 {
        Tier::NeedsImprovement
    } else {
        Tier::Poor
    }
}

/// Longest unbroken run of on-time events, scanned left to right.
///
/// The input must already be sorted ascending by date. This function does
/// not sort and cannot detect unsorted input; passing an unsorted history
/// yields a meaningless answer. An empty history is a streak of 0.
pub fn longest_on_time_streak(statuses: &[Status]) -> usize {
    let mut best = 0usize;
    let mut streak = 0usize;
    for status in statuses {
        if *status == Status::OnTime {
            streak += 1;
            best = best.max(streak);
        } else {
            streak = 0;
        }
    }
    best
}

/// Inspects only the most recent event of a date-ascending history. Sorting
/// is the caller's obligation, as with [`longest_on_time_streak`].
pub fn latest_status_alert(statuses: &[Status]) -> Result<Option<Alert>, HistoryError> {
    match statuses.last() {
        None => Err(HistoryError::EmptyHistory),
        Some(Status::Absent) => Ok(Some(Alert::AbsentAlert)),
        Some(Status::Late) => Ok(Some(Alert::LateAlert)),
        Some(_) => Ok(None),
    }
}

/// Folds one subject's date-ascending event history into a [`RatingSummary`].
pub fn summarize_subject(events: &[AttendanceEvent]) -> Result<RatingSummary, HistoryError> {
    let first = events.first().ok_or(HistoryError::EmptyHistory)?;
    let statuses: Vec<Status> = events.iter().map(|e| e.status).collect();

    let mean_score = mean_rating(&statuses)?;
    Ok(RatingSummary {
        subject_id: first.subject_id.clone(),
        subject_name: first.subject_name.clone(),
        group_name: first.group_name.clone(),
        event_count: events.len(),
        mean_score,
        tier: rating_tier(mean_score),
        longest_on_time_streak: longest_on_time_streak(&statuses),
        latest_alert: latest_status_alert(&statuses)?,
    })
}

/// Summarizes every subject in a batch of events ordered by subject then
/// date ascending (the order the persistence layer fetches in), sorted by
/// mean score descending.
pub fn summarize_all(events: &[AttendanceEvent]) -> Vec<RatingSummary> {
    let mut summaries: Vec<RatingSummary> = events
        .chunk_by(|a, b| a.subject_id == b.subject_id)
        .filter_map(|history| summarize_subject(history).ok())
        .collect();

    summaries.sort_by(|a, b| {
        b.mean_score
            .partial_cmp(&a.mean_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    summaries
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    use crate::models::Status::{Absent, Late, OnTime};

    fn history(subject_id: &str, statuses: &[Status]) -> Vec<AttendanceEvent> {
        statuses
            .iter()
            .enumerate()
            .map(|(i, status)| AttendanceEvent {
                subject_id: subject_id.to_string(),
                subject_name: "Avery Lee".to_string(),
                group_name: "Section A".to_string(),
                date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
                    + chrono::Duration::days(i as i64),
                time_in: None,
                status: *status,
            })
            .collect()
    }

    #[test]
    fn mean_rating_rejects_empty_history() {
        assert_eq!(mean_rating(&[]), Err(HistoryError::EmptyHistory));
    }

    #[test]
    fn mean_rating_averages_scores() {
        assert_eq!(mean_rating(&[OnTime, OnTime]), Ok(3.0));
        assert_eq!(mean_rating(&[OnTime, Late]), Ok(2.5));
    }

    #[test]
    fn tier_boundaries_belong_to_the_higher_tier() {
        assert_eq!(rating_tier(2.5), Tier::Excellent);
        assert_eq!(rating_tier(2.49999), Tier::Good);
        assert_eq!(rating_tier(1.8), Tier::Good);
        assert_eq!(rating_tier(1.0), Tier::NeedsImprovement);
        assert_eq!(rating_tier(0.99), Tier::Poor);
    }

    #[test]
    fn empty_history_has_zero_streak() {
        assert_eq!(longest_on_time_streak(&[]), 0);
    }

    #[test]
    fn streak_resets_on_any_interruption() {
        assert_eq!(longest_on_time_streak(&[OnTime, OnTime, Late, OnTime]), 2);
        assert_eq!(longest_on_time_streak(&[OnTime, OnTime, OnTime]), 3);
        assert_eq!(longest_on_time_streak(&[Late, Absent, Late]), 0);
    }

    #[test]
    fn streak_tracks_a_trailing_run() {
        assert_eq!(
            longest_on_time_streak(&[OnTime, Absent, OnTime, OnTime, OnTime]),
            3
        );
    }

    #[test]
    fn alert_reflects_only_the_latest_event() {
        assert_eq!(latest_status_alert(&[OnTime, Late]), Ok(Some(Alert::LateAlert)));
        assert_eq!(latest_status_alert(&[Late, OnTime]), Ok(None));
        assert_eq!(
            latest_status_alert(&[OnTime, Absent]),
            Ok(Some(Alert::AbsentAlert))
        );
        assert_eq!(latest_status_alert(&[]), Err(HistoryError::EmptyHistory));
    }

    #[test]
    fn summarizes_a_full_history() {
        let events = history("u-001", &[OnTime, OnTime, Absent, OnTime, OnTime, OnTime]);
        let summary = summarize_subject(&events).unwrap();

        assert_eq!(summary.subject_id, "u-001");
        assert_eq!(summary.event_count, 6);
        assert!((summary.mean_score - 16.0 / 6.0).abs() < 1e-9);
        assert_eq!(summary.tier, Tier::Excellent);
        assert_eq!(summary.longest_on_time_streak, 3);
        assert_eq!(summary.latest_alert, None);
    }

    #[test]
    fn summarize_rejects_empty_history() {
        assert_eq!(summarize_subject(&[]), Err(HistoryError::EmptyHistory));
    }

    #[test]
    fn batch_summaries_rank_by_mean_score() {
        let mut events = history("stu-022", &[Late, Absent, Late]);
        events.extend(history("stu-014", &[OnTime, OnTime, Late]));

        let summaries = summarize_all(&events);
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].subject_id, "stu-014");
        assert_eq!(summaries[0].tier, Tier::Excellent);
        assert_eq!(summaries[1].subject_id, "stu-022");
        assert_eq!(summaries[1].tier, Tier::NeedsImprovement);
    }

    #[test]
    fn unrecognized_statuses_drag_the_mean_down() {
        let mean = mean_rating(&[OnTime, Status::Unrecognized]).unwrap();
        assert_eq!(mean, 1.5);
        assert_eq!(rating_tier(mean), Tier::NeedsImprovement);
    }
}
