//! Next-occurrence calculation for scheduled profiles
//!
//! Pure chrono arithmetic over immutable timestamps: no clock reads,
//! no shared state. The scheduler supplies the reference weekday, so
//! tests can drive arbitrary dates.

use chrono::{DateTime, Datelike, Duration, Utc};
use tracing::debug;

use crate::db::models::{Day, SoundProfile};

/// Calendar-aware day addition (month/year rollover handled by chrono)
pub fn add_days(ts: DateTime<Utc>, days: i64) -> DateTime<Utc> {
    ts + Duration::days(days)
}

/// First date strictly after `ts` whose weekday is in `repeat_days`,
/// preserving `ts`'s time-of-day.
///
/// The search starts the day after the date embedded in `ts` and walks
/// forward one day at a time, wrapping past Saturday into the next
/// week. It never returns the anchor date itself, even when the
/// anchor's weekday is a member of `repeat_days`. Returns None when
/// `repeat_days` is empty (the search would not terminate).
pub fn next_repeat_date(ts: DateTime<Utc>, repeat_days: &[Day]) -> Option<DateTime<Utc>> {
    if repeat_days.is_empty() {
        return None;
    }
    let mut next = ts + Duration::days(1);
    while !repeat_days.contains(&Day::from_weekday(next.weekday())) {
        next += Duration::days(1);
    }
    Some(next)
}

/// Compute the next occurrence of a profile's window, or None when the
/// profile is one-shot and the series ends.
///
/// `current_day` is the caller-computed "today" reference weekday.
/// The repeat-days search anchors on each timestamp's own embedded
/// date; when the reference disagrees with the start timestamp's
/// weekday (possible after independent edits of start and end), the
/// mismatch is logged at debug level.
///
/// - `repeat_everyday`: both timestamps advance exactly one day.
/// - non-empty `repeat_days`: each timestamp advances independently to
///   the next member weekday, time-of-day preserved.
/// - neither: None. The caller must not re-register timers.
pub fn compute_next(current_day: Day, profile: &SoundProfile) -> Option<SoundProfile> {
    if profile.repeat_everyday {
        return Some(SoundProfile {
            start_time: add_days(profile.start_time, 1),
            end_time: add_days(profile.end_time, 1),
            ..profile.clone()
        });
    }
    if !profile.repeat_days.is_empty() {
        if Day::from_weekday(profile.start_time.weekday()) != current_day {
            debug!(
                profile_id = profile.id,
                reference = ?current_day,
                anchor = ?Day::from_weekday(profile.start_time.weekday()),
                "reference weekday differs from start anchor"
            );
        }
        let start_time = next_repeat_date(profile.start_time, &profile.repeat_days)?;
        let end_time = next_repeat_date(profile.end_time, &profile.repeat_days)?;
        return Some(SoundProfile {
            start_time,
            end_time,
            ..profile.clone()
        });
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    fn profile(
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        repeat_everyday: bool,
        repeat_days: Vec<Day>,
    ) -> SoundProfile {
        SoundProfile {
            id: 1,
            title: "Test Profile".to_string(),
            description: "Test Description".to_string(),
            media_volume: 0.5,
            notification_volume: 0.5,
            ringer_volume: 0.5,
            call_volume: 0.5,
            alarm_volume: 0.5,
            start_time: start,
            end_time: end,
            is_active: true,
            repeat_everyday,
            repeat_days,
        }
    }

    #[test]
    fn test_add_days_rolls_over_month_boundary() {
        assert_eq!(add_days(ts(2023, 10, 31, 9, 0), 1), ts(2023, 11, 1, 9, 0));
        assert_eq!(add_days(ts(2023, 12, 31, 9, 0), 1), ts(2024, 1, 1, 9, 0));
    }

    #[test]
    fn test_repeat_everyday_advances_both_timestamps_one_day() {
        let p = profile(
            ts(2023, 10, 1, 10, 0),
            ts(2023, 10, 2, 16, 30),
            true,
            Vec::new(),
        );

        // The reference weekday must not influence the everyday policy.
        for day in Day::ALL {
            let next = compute_next(day, &p).unwrap();
            assert_eq!(next.start_time, ts(2023, 10, 2, 10, 0));
            assert_eq!(next.end_time, ts(2023, 10, 3, 16, 30));
        }
    }

    #[test]
    fn test_one_shot_has_no_next_occurrence() {
        let p = profile(
            ts(2024, 8, 17, 10, 0),
            ts(2024, 8, 17, 20, 30),
            false,
            Vec::new(),
        );
        for day in Day::ALL {
            assert!(compute_next(day, &p).is_none());
        }
    }

    #[test]
    fn test_repeat_days_saturday_to_sunday() {
        // 2024-08-17 is a Saturday; the next member day is Sunday the 18th.
        let p = profile(
            ts(2024, 8, 17, 10, 0),
            ts(2024, 8, 17, 20, 30),
            false,
            vec![Day::Sunday, Day::Wednesday],
        );

        let next = compute_next(Day::Saturday, &p).unwrap();
        assert_eq!(next.start_time, ts(2024, 8, 18, 10, 0));
        assert_eq!(next.end_time, ts(2024, 8, 18, 20, 30));
    }

    #[test]
    fn test_repeat_days_chains_sunday_to_wednesday() {
        let p = profile(
            ts(2024, 8, 18, 10, 0),
            ts(2024, 8, 18, 20, 30),
            false,
            vec![Day::Sunday, Day::Wednesday],
        );

        let next = compute_next(Day::Sunday, &p).unwrap();
        assert_eq!(next.start_time, ts(2024, 8, 21, 10, 0));
        assert_eq!(next.end_time, ts(2024, 8, 21, 20, 30));
    }

    #[test]
    fn test_repeat_days_multi_day_gap() {
        // Sat 2024-08-17 -> Sun 18 -> Mon 19 -> Fri 23, skipping the
        // Tue/Wed/Thu gap between members.
        let mut p = profile(
            ts(2024, 8, 17, 10, 0),
            ts(2024, 8, 17, 20, 30),
            false,
            vec![Day::Monday, Day::Friday, Day::Sunday],
        );

        p = compute_next(Day::Saturday, &p).unwrap();
        assert_eq!(p.start_time, ts(2024, 8, 18, 10, 0));
        assert_eq!(p.end_time, ts(2024, 8, 18, 20, 30));

        p = compute_next(Day::Sunday, &p).unwrap();
        assert_eq!(p.start_time, ts(2024, 8, 19, 10, 0));
        assert_eq!(p.end_time, ts(2024, 8, 19, 20, 30));

        p = compute_next(Day::Monday, &p).unwrap();
        assert_eq!(p.start_time, ts(2024, 8, 23, 10, 0));
        assert_eq!(p.end_time, ts(2024, 8, 23, 20, 30));
    }

    #[test]
    fn test_anchor_day_in_set_still_advances() {
        // Anchor is a Wednesday and Wednesday is a member; the result
        // must be the following Wednesday, never the anchor itself.
        let anchor = ts(2024, 8, 21, 9, 0);
        let next = next_repeat_date(anchor, &[Day::Wednesday]).unwrap();
        assert_eq!(next, ts(2024, 8, 28, 9, 0));
    }

    #[test]
    fn test_next_repeat_date_strictly_later_for_all_anchors() {
        let days = vec![Day::Tuesday, Day::Saturday];
        // One full week of anchors: every result is strictly later and
        // lands on a member day.
        for offset in 0..7 {
            let anchor = add_days(ts(2024, 8, 17, 6, 15), offset);
            let next = next_repeat_date(anchor, &days).unwrap();
            assert!(next > anchor);
            assert!(days.contains(&Day::from_weekday(next.weekday())));
            // Time-of-day is preserved.
            assert_eq!(next.time(), anchor.time());
        }
    }

    #[test]
    fn test_next_repeat_date_empty_set_is_none() {
        assert!(next_repeat_date(ts(2024, 8, 17, 10, 0), &[]).is_none());
    }

    #[test]
    fn test_iteration_produces_strictly_increasing_member_dates() {
        let days = vec![Day::Monday, Day::Thursday];
        let mut p = profile(
            ts(2024, 8, 17, 10, 0),
            ts(2024, 8, 17, 20, 30),
            false,
            days.clone(),
        );

        let mut previous = p.start_time;
        for _ in 0..10 {
            let today = Day::from_weekday(p.start_time.weekday());
            p = compute_next(today, &p).unwrap();
            assert!(p.start_time > previous);
            assert!(days.contains(&Day::from_weekday(p.start_time.weekday())));
            assert!(days.contains(&Day::from_weekday(p.end_time.weekday())));
            previous = p.start_time;
        }
    }

    #[test]
    fn test_everyday_iteration_is_consecutive_dates() {
        let mut p = profile(
            ts(2024, 2, 27, 8, 0),
            ts(2024, 2, 27, 9, 0),
            true,
            Vec::new(),
        );

        // Crosses the 2024 leap-day boundary.
        let expected = [
            ts(2024, 2, 28, 8, 0),
            ts(2024, 2, 29, 8, 0),
            ts(2024, 3, 1, 8, 0),
            ts(2024, 3, 2, 8, 0),
        ];
        for want in expected {
            p = compute_next(Day::from_weekday(p.start_time.weekday()), &p).unwrap();
            assert_eq!(p.start_time, want);
        }
    }

    #[test]
    fn test_overnight_window_advances_each_timestamp_from_its_own_date() {
        // Start Saturday night, end Sunday morning: each timestamp
        // searches from its own embedded date, so they stay one
        // calendar day apart only when the member set allows it.
        let p = profile(
            ts(2024, 8, 17, 22, 0),
            ts(2024, 8, 18, 6, 0),
            false,
            vec![Day::Sunday, Day::Monday],
        );

        let next = compute_next(Day::Saturday, &p).unwrap();
        assert_eq!(next.start_time, ts(2024, 8, 18, 22, 0));
        assert_eq!(next.end_time, ts(2024, 8, 19, 6, 0));
    }

    #[test]
    fn test_repeat_everyday_wins_over_repeat_days() {
        let p = profile(
            ts(2024, 8, 17, 10, 0),
            ts(2024, 8, 17, 20, 30),
            true,
            vec![Day::Wednesday],
        );

        let next = compute_next(Day::Saturday, &p).unwrap();
        // Everyday policy: plain one-day advance, the member set is ignored.
        assert_eq!(next.start_time, ts(2024, 8, 18, 10, 0));
        assert_eq!(next.end_time, ts(2024, 8, 18, 20, 30));
    }

    #[test]
    fn test_compute_next_preserves_non_schedule_fields() {
        let p = profile(
            ts(2024, 8, 17, 10, 0),
            ts(2024, 8, 17, 20, 30),
            false,
            vec![Day::Sunday],
        );
        let next = compute_next(Day::Saturday, &p).unwrap();
        assert_eq!(next.id, p.id);
        assert_eq!(next.title, p.title);
        assert_eq!(next.volumes(), p.volumes());
        assert_eq!(next.is_active, p.is_active);
        assert_eq!(next.repeat_days, p.repeat_days);
    }
}
