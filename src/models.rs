use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;

/// Closed attendance vocabulary. Dataset-specific spellings are normalized
/// through [`Status::from_label`]; anything unmapped becomes `Unrecognized`
/// so it can flow through aggregates with a rating score of 0 instead of
/// aborting a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Status {
    OnTime,
    Late,
    Absent,
    Unrecognized,
}

impl Status {
    pub fn from_label(label: &str) -> Status {
        let normalized: String = label
            .trim()
            .to_lowercase()
            .chars()
            .filter(|c| !matches!(*c, ' ' | '_' | '-'))
            .collect();
        match normalized.as_str() {
            "ontime" | "present" => Status::OnTime,
            "late" => Status::Late,
            "absent" => Status::Absent,
            _ => Status::Unrecognized,
        }
    }

    pub fn as_label(self) -> &'static str {
        match self {
            Status::OnTime => "On Time",
            Status::Late => "Late",
            Status::Absent => "Absent",
            Status::Unrecognized => "Unknown",
        }
    }
}

/// Coarse rating label derived from a subject's mean rating score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Tier {
    Excellent,
    Good,
    NeedsImprovement,
    Poor,
}

impl Tier {
    pub fn as_label(self) -> &'static str {
        match self {
            Tier::Excellent => "Excellent",
            Tier::Good => "Good",
            Tier::NeedsImprovement => "Needs Improvement",
            Tier::Poor => "Poor",
        }
    }
}

/// Raised when a subject's most recent recorded status warrants follow-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Alert {
    AbsentAlert,
    LateAlert,
}

impl Alert {
    pub fn as_label(self) -> &'static str {
        match self {
            Alert::AbsentAlert => "absent at last session",
            Alert::LateAlert => "late at last session",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Member {
    pub user_id: String,
    pub name: String,
    pub group_name: String,
}

#[derive(Debug, Clone)]
pub struct AttendanceEvent {
    pub subject_id: String,
    pub subject_name: String,
    pub group_name: String,
    pub date: NaiveDate,
    pub time_in: Option<NaiveTime>,
    pub status: Status,
}

/// Derived per subject, never persisted; recomputed from the full ordered
/// event history whenever it is needed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatingSummary {
    pub subject_id: String,
    pub subject_name: String,
    pub group_name: String,
    pub event_count: usize,
    pub mean_score: f64,
    pub tier: Tier,
    pub longest_on_time_streak: usize,
    pub latest_alert: Option<Alert>,
}
