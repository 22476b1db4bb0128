//! Shift-window evaluation
//!
//! Pure functions: the decision is fully determined by the record set and
//! the supplied instant. All instants are UTC; recurring windows compare the
//! instant's weekday and time-of-day at seconds precision.

use chrono::{DateTime, Datelike, NaiveTime, Timelike, Utc};

use super::{Shift, ShiftKind, ShiftStatus};

/// Decide whether a user owning `shifts` is authorized to act at `now`.
///
/// The evaluator filters to active records itself. No active records means
/// no scheduling restriction is configured, so the answer is `true`.
/// Otherwise at least one active window must contain `now`: exception
/// records are checked on their absolute bounds regardless of weekday,
/// recurring records on weekday membership plus inclusive time-of-day
/// bounds. Malformed records (missing fields for their kind, empty weekday
/// set, exception end before start) simply never match.
pub fn is_authorized_now(shifts: &[Shift], now: DateTime<Utc>) -> bool {
    let mut saw_active = false;

    let weekday = now.weekday().num_days_from_sunday() as u8;
    let time_of_day = truncate_to_seconds(now.time());

    for shift in shifts.iter().filter(|s| s.status == ShiftStatus::Active) {
        saw_active = true;
        let matched = match shift.kind {
            ShiftKind::Exception => matches_exception(shift, now),
            ShiftKind::Recurring => matches_recurring(shift, weekday, time_of_day),
        };
        if matched {
            return true;
        }
    }

    !saw_active
}

fn matches_exception(shift: &Shift, now: DateTime<Utc>) -> bool {
    match (shift.exception_start, shift.exception_end) {
        (Some(start), Some(end)) => start <= now && now <= end,
        _ => false,
    }
}

fn matches_recurring(shift: &Shift, weekday: u8, time_of_day: NaiveTime) -> bool {
    let (Some(days), Some(start), Some(end)) =
        (shift.days_of_week.as_ref(), shift.start_time, shift.end_time)
    else {
        return false;
    };

    if !days.contains(&weekday) {
        return false;
    }

    start <= time_of_day && time_of_day <= end
}

/// The inclusive end bound is expressed at seconds granularity; drop
/// sub-second noise so 17:00:00.4 still counts as 17:00:00.
fn truncate_to_seconds(time: NaiveTime) -> NaiveTime {
    time.with_nanosecond(0).unwrap_or(time)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    fn recurring(days: Vec<u8>, start: &str, end: &str, status: ShiftStatus) -> Shift {
        let now = at(2024, 1, 1, 0, 0, 0);
        Shift {
            id: "r1".into(),
            user_id: "u1".into(),
            kind: ShiftKind::Recurring,
            start_time: start.parse().ok(),
            end_time: end.parse().ok(),
            days_of_week: Some(days),
            exception_start: None,
            exception_end: None,
            status,
            approved_by: None,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn exception(start: DateTime<Utc>, end: DateTime<Utc>) -> Shift {
        let now = at(2024, 1, 1, 0, 0, 0);
        Shift {
            id: "e1".into(),
            user_id: "u1".into(),
            kind: ShiftKind::Exception,
            start_time: None,
            end_time: None,
            days_of_week: None,
            exception_start: Some(start),
            exception_end: Some(end),
            status: ShiftStatus::Active,
            approved_by: Some("sup1".into()),
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_no_records_is_always_authorized() {
        assert!(is_authorized_now(&[], at(2024, 5, 15, 3, 0, 0)));
    }

    #[test]
    fn test_only_inactive_records_is_authorized() {
        // Inactive and expired records impose no restriction.
        let shifts = vec![
            recurring(vec![3], "09:00:00", "17:00:00", ShiftStatus::Inactive),
            recurring(vec![3], "09:00:00", "17:00:00", ShiftStatus::Expired),
        ];
        assert!(is_authorized_now(&shifts, at(2024, 5, 14, 12, 0, 0)));
    }

    #[test]
    fn test_recurring_window_weekday_and_time() {
        // Mon(1), Wed(3), Fri(5), 09:00-17:00.
        let shifts = vec![recurring(
            vec![1, 3, 5],
            "09:00:00",
            "17:00:00",
            ShiftStatus::Active,
        )];

        // 2024-05-15 is a Wednesday.
        assert!(is_authorized_now(&shifts, at(2024, 5, 15, 12, 0, 0)));
        // Tuesday noon: wrong weekday.
        assert!(!is_authorized_now(&shifts, at(2024, 5, 14, 12, 0, 0)));
        // Wednesday 18:00: outside the window.
        assert!(!is_authorized_now(&shifts, at(2024, 5, 15, 18, 0, 0)));
        // Bounds are inclusive on both ends.
        assert!(is_authorized_now(&shifts, at(2024, 5, 15, 9, 0, 0)));
        assert!(is_authorized_now(&shifts, at(2024, 5, 15, 17, 0, 0)));
    }

    #[test]
    fn test_recurring_with_empty_days_never_matches() {
        let shifts = vec![recurring(vec![], "09:00:00", "17:00:00", ShiftStatus::Active)];
        assert!(!is_authorized_now(&shifts, at(2024, 5, 15, 12, 0, 0)));
    }

    #[test]
    fn test_recurring_with_missing_times_never_matches() {
        let mut shift = recurring(vec![3], "09:00:00", "17:00:00", ShiftStatus::Active);
        shift.start_time = None;
        assert!(!is_authorized_now(&[shift], at(2024, 5, 15, 12, 0, 0)));
    }

    #[test]
    fn test_exception_matches_on_absolute_bounds() {
        let shifts = vec![exception(
            at(2024, 1, 1, 0, 0, 0),
            at(2024, 1, 1, 23, 59, 59),
        )];
        // 2024-01-01 is a Monday; no recurring record covers it, the
        // exception alone authorizes.
        assert!(is_authorized_now(&shifts, at(2024, 1, 1, 12, 0, 0)));
        assert!(!is_authorized_now(&shifts, at(2024, 1, 2, 12, 0, 0)));
    }

    #[test]
    fn test_exception_end_before_start_never_matches() {
        // No silent bound swap.
        let shifts = vec![exception(
            at(2024, 1, 1, 23, 59, 59),
            at(2024, 1, 1, 0, 0, 0),
        )];
        assert!(!is_authorized_now(&shifts, at(2024, 1, 1, 12, 0, 0)));
    }

    #[test]
    fn test_exception_missing_bound_never_matches() {
        let mut shift = exception(at(2024, 1, 1, 0, 0, 0), at(2024, 1, 2, 0, 0, 0));
        shift.exception_end = None;
        assert!(!is_authorized_now(&[shift], at(2024, 1, 1, 12, 0, 0)));
    }

    #[test]
    fn test_any_matching_record_suffices() {
        let shifts = vec![
            recurring(vec![2], "09:00:00", "17:00:00", ShiftStatus::Active),
            exception(at(2024, 5, 15, 11, 0, 0), at(2024, 5, 15, 13, 0, 0)),
        ];
        // Wednesday noon: recurring misses (Tuesday-only), exception hits.
        assert!(is_authorized_now(&shifts, at(2024, 5, 15, 12, 0, 0)));
    }

    #[test]
    fn test_subsecond_instant_inside_inclusive_end() {
        let shifts = vec![recurring(vec![3], "09:00:00", "17:00:00", ShiftStatus::Active)];
        let now = at(2024, 5, 15, 17, 0, 0) + chrono::Duration::milliseconds(400);
        assert!(is_authorized_now(&shifts, now));
    }
}
