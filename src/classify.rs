use chrono::NaiveTime;

use crate::models::Status;

/// Official check-in cutoff when none is configured, matching the 08:00
/// session start used across the attendance datasets.
pub const DEFAULT_CUTOFF: NaiveTime = match NaiveTime::from_hms_opt(8, 0, 0) {
    Some(t) => t,
    None => unreachable!(),
};

/// Classifies one observed check-in against the official cutoff. Arriving
/// exactly at the cutoff counts as on time. Absence cannot be observed from
/// a single check-in, so this never returns `Absent`; pre-labeled datasets
/// supply that status directly.
pub fn classify_by_cutoff(observed: NaiveTime, cutoff: NaiveTime) -> Status {
    if observed <= cutoff {
        Status::OnTime
    } else {
        Status::Late
    }
}

pub fn rating_score(status: Status) -> u32 {
    match status {
        Status::OnTime => 3,
        Status::Late => 2,
        Status::Absent => 1,
        Status::Unrecognized => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(h: u32, m: u32, s: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, s).unwrap()
    }

    #[test]
    fn arrival_at_cutoff_is_on_time() {
        assert_eq!(classify_by_cutoff(at(8, 0, 0), DEFAULT_CUTOFF), Status::OnTime);
    }

    #[test]
    fn arrival_before_cutoff_is_on_time() {
        assert_eq!(classify_by_cutoff(at(7, 59, 59), DEFAULT_CUTOFF), Status::OnTime);
    }

    #[test]
    fn arrival_after_cutoff_is_late() {
        assert_eq!(classify_by_cutoff(at(8, 0, 1), DEFAULT_CUTOFF), Status::Late);
        assert_eq!(classify_by_cutoff(at(13, 30, 0), DEFAULT_CUTOFF), Status::Late);
    }

    #[test]
    fn respects_custom_cutoff() {
        let cutoff = at(9, 15, 0);
        assert_eq!(classify_by_cutoff(at(9, 15, 0), cutoff), Status::OnTime);
        assert_eq!(classify_by_cutoff(at(9, 16, 0), cutoff), Status::Late);
    }

    #[test]
    fn scores_follow_fixed_mapping() {
        assert_eq!(rating_score(Status::OnTime), 3);
        assert_eq!(rating_score(Status::Late), 2);
        assert_eq!(rating_score(Status::Absent), 1);
        assert_eq!(rating_score(Status::Unrecognized), 0);
    }

    #[test]
    fn unmapped_labels_degrade_to_zero() {
        assert_eq!(rating_score(Status::from_label("Excused")), 0);
        assert_eq!(rating_score(Status::from_label("")), 0);
    }

    #[test]
    fn labels_normalize_to_vocabulary() {
        assert_eq!(Status::from_label("On Time"), Status::OnTime);
        assert_eq!(Status::from_label("on_time"), Status::OnTime);
        assert_eq!(Status::from_label("PRESENT"), Status::OnTime);
        assert_eq!(Status::from_label(" late "), Status::Late);
        assert_eq!(Status::from_label("Absent"), Status::Absent);
    }
}
