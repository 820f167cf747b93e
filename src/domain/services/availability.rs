use crate::domain::models::schedule::{TimeRange, WeeklySchedule};
use chrono::{DateTime, Datelike, NaiveTime, Timelike, Utc, Weekday};

/// Decides whether `[start, end]` falls inside one of the mentor's open
/// ranges for that weekday.
///
/// The stored "HH:MM" wall-clock strings are compared against the UTC
/// hour/minute of the candidate instants; the template has no timezone
/// of its own, so availability is a UTC-clock contract.
///
/// The candidate must be fully contained in a single contiguous range; a
/// candidate straddling two adjacent ranges is rejected.
pub fn is_within_schedule(
    schedule: &WeeklySchedule,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> bool {
    let day_ranges = ranges_for_weekday(schedule, start.weekday());

    let start_min = start.hour() * 60 + start.minute();
    let end_min = end.hour() * 60 + end.minute();

    day_ranges.iter().any(|range| {
        match (parse_hhmm(&range.start_time), parse_hhmm(&range.end_time)) {
            (Some(slot_start), Some(slot_end)) => start_min >= slot_start && end_min <= slot_end,
            // A malformed range is unusable, never a panic.
            _ => false,
        }
    })
}

fn ranges_for_weekday(schedule: &WeeklySchedule, weekday: Weekday) -> &[TimeRange] {
    match weekday {
        Weekday::Mon => &schedule.monday,
        Weekday::Tue => &schedule.tuesday,
        Weekday::Wed => &schedule.wednesday,
        Weekday::Thu => &schedule.thursday,
        Weekday::Fri => &schedule.friday,
        Weekday::Sat => &schedule.saturday,
        Weekday::Sun => &schedule.sunday,
    }
}

fn parse_hhmm(s: &str) -> Option<u32> {
    let t = NaiveTime::parse_from_str(s, "%H:%M").ok()?;
    Some(t.hour() * 60 + t.minute())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn range(start: &str, end: &str) -> TimeRange {
        TimeRange {
            start_time: start.to_string(),
            end_time: end.to_string(),
        }
    }

    fn monday_schedule(ranges: Vec<TimeRange>) -> WeeklySchedule {
        WeeklySchedule {
            monday: ranges,
            ..Default::default()
        }
    }

    // 2025-06-02 is a Monday.
    fn monday_at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 2, h, m, 0).unwrap()
    }

    #[test]
    fn contained_candidate_is_accepted() {
        let schedule = monday_schedule(vec![range("09:00", "12:00"), range("14:00", "18:00")]);
        assert!(is_within_schedule(&schedule, monday_at(9, 30), monday_at(10, 30)));
    }

    #[test]
    fn exact_range_boundaries_are_accepted() {
        let schedule = monday_schedule(vec![range("09:00", "12:00")]);
        assert!(is_within_schedule(&schedule, monday_at(9, 0), monday_at(12, 0)));
    }

    #[test]
    fn candidate_straddling_two_ranges_is_rejected() {
        let schedule = monday_schedule(vec![range("09:00", "12:00"), range("14:00", "18:00")]);
        assert!(!is_within_schedule(&schedule, monday_at(11, 0), monday_at(13, 0)));
    }

    #[test]
    fn candidate_outside_all_ranges_is_rejected() {
        let schedule = monday_schedule(vec![range("09:00", "12:00")]);
        assert!(!is_within_schedule(&schedule, monday_at(13, 0), monday_at(14, 0)));
    }

    #[test]
    fn empty_weekday_rejects_everything() {
        let schedule = monday_schedule(vec![]);
        assert!(!is_within_schedule(&schedule, monday_at(10, 0), monday_at(11, 0)));
    }

    #[test]
    fn weekday_lookup_uses_the_start_instant() {
        // Tuesday has the range, the candidate is on Monday.
        let schedule = WeeklySchedule {
            tuesday: vec![range("09:00", "18:00")],
            ..Default::default()
        };
        assert!(!is_within_schedule(&schedule, monday_at(10, 0), monday_at(11, 0)));
    }

    #[test]
    fn malformed_range_is_skipped() {
        let schedule = monday_schedule(vec![range("9am", "noon"), range("10:00", "12:00")]);
        assert!(is_within_schedule(&schedule, monday_at(10, 0), monday_at(11, 0)));
        assert!(!is_within_schedule(&schedule, monday_at(9, 0), monday_at(10, 0)));
    }
}
