//! Parsing of legacy, human-entered schedule strings such as
//! `"Tue/Thu 3:30 PM - 5:00 PM"`.
//!
//! The grammar is the equivalent of `(\d{1,2})(:\d{2})?\s*(am|pm)?`, matched
//! case-insensitively; the first match in the string wins. When no am/pm marker
//! is present, hours 1 through 6 are read as afternoon hours. That guess suits
//! school timetables and will misread a genuine 1-6 AM entry.

use chrono::NaiveTime;

use crate::models::ClassSchedule;
use crate::scheduling::pattern::{weekday_name, DaySet, WEEK};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleTime {
    pub hour: u32,
    pub minute: u32,
}

impl ScheduleTime {
    pub fn minute_of_day(&self) -> u32 {
        self.hour * 60 + self.minute
    }

    pub fn to_naive_time(&self) -> Option<NaiveTime> {
        NaiveTime::from_hms_opt(self.hour, self.minute, 0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Meridiem {
    Am,
    Pm,
}

#[derive(Debug, Clone, Copy)]
struct RawTime {
    hour: u32,
    minute: u32,
    meridiem: Option<Meridiem>,
    /// Byte offset just past the match.
    end: usize,
}

impl RawTime {
    fn to_24h(self) -> Option<ScheduleTime> {
        let hour = match self.meridiem {
            Some(Meridiem::Pm) if self.hour != 12 => self.hour + 12,
            Some(Meridiem::Am) if self.hour == 12 => 0,
            Some(_) => self.hour,
            None if (1..=6).contains(&self.hour) => self.hour + 12,
            None => self.hour,
        };
        if hour > 23 || self.minute > 59 {
            return None;
        }
        Some(ScheduleTime {
            hour,
            minute: self.minute,
        })
    }
}

fn scan_time(schedule: &str, from: usize) -> Option<RawTime> {
    let bytes = schedule.as_bytes();
    let start = (from..bytes.len()).find(|&i| bytes[i].is_ascii_digit())?;

    let mut pos = start;
    while pos < bytes.len() && pos - start < 2 && bytes[pos].is_ascii_digit() {
        pos += 1;
    }
    let hour: u32 = schedule[start..pos].parse().ok()?;

    let mut minute = 0;
    let is_digit = |i: usize| bytes.get(i).is_some_and(|b| b.is_ascii_digit());
    if bytes.get(pos) == Some(&b':') && is_digit(pos + 1) && is_digit(pos + 2) {
        minute = schedule[pos + 1..pos + 3].parse().ok()?;
        pos += 3;
    }

    let mut cursor = pos;
    while bytes.get(cursor).is_some_and(|b| b.is_ascii_whitespace()) {
        cursor += 1;
    }
    let meridiem = match bytes.get(cursor..cursor + 2) {
        Some(m) if m.eq_ignore_ascii_case(b"am") => Some(Meridiem::Am),
        Some(m) if m.eq_ignore_ascii_case(b"pm") => Some(Meridiem::Pm),
        _ => None,
    };
    if meridiem.is_some() {
        pos = cursor + 2;
    }

    Some(RawTime {
        hour,
        minute,
        meridiem,
        end: pos,
    })
}

/// Extracts the first time of day in a free-text schedule. `None` means the
/// time is unknown, never midnight.
pub fn parse_schedule_time(schedule: &str) -> Option<ScheduleTime> {
    scan_time(schedule, 0)?.to_24h()
}

/// Case-insensitive test for the weekday's three-letter prefix, so `Tuesday`
/// matches `"Tue/Thu ..."`.
pub fn day_matches(schedule: &str, weekday: &str) -> bool {
    let prefix: String = weekday.chars().take(3).collect::<String>().to_lowercase();
    if prefix.is_empty() {
        return false;
    }
    schedule.to_lowercase().contains(&prefix)
}

/// Whether a legacy-scheduled class meets on `weekday` during `hour` (24h).
pub fn occurs_at(schedule: &str, weekday: &str, hour: u32) -> bool {
    day_matches(schedule, weekday)
        && parse_schedule_time(schedule).is_some_and(|t| t.hour == hour)
}

/// Start time plus the duration implied by a trailing `- end` time, if any.
pub fn parse_schedule_span(schedule: &str) -> Option<(ScheduleTime, Option<u32>)> {
    let first = scan_time(schedule, 0)?;
    let start = first.to_24h()?;

    let duration = scan_time(schedule, first.end).and_then(|second| {
        let gap = &schedule[first.end..];
        let between = gap[..gap.find(|c: char| c.is_ascii_digit()).unwrap_or(gap.len())].trim();
        if !matches!(between, "-" | "–" | "to") {
            return None;
        }
        let end = second.to_24h()?;
        end.minute_of_day()
            .checked_sub(start.minute_of_day())
            .filter(|d| *d > 0)
    });

    Some((start, duration))
}

/// Derives a structured weekly schedule from legacy text, or `None` when the
/// text names no weekday or no parseable time.
pub fn normalize_legacy(schedule: &str, default_duration: u32) -> Option<ClassSchedule> {
    let days = DaySet::from_days(
        WEEK.into_iter()
            .filter(|d| day_matches(schedule, weekday_name(*d))),
    );
    if days.is_empty() {
        return None;
    }
    let (start, duration) = parse_schedule_span(schedule)?;
    Some(ClassSchedule::Timed {
        days,
        time: start.to_naive_time()?,
        duration_minutes: duration.unwrap_or(default_duration),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    fn hm(hour: u32, minute: u32) -> Option<ScheduleTime> {
        Some(ScheduleTime { hour, minute })
    }

    #[test]
    fn test_parse_with_meridiem() {
        assert_eq!(parse_schedule_time("Tue/Thu 3:30 PM"), hm(15, 30));
        assert_eq!(parse_schedule_time("Mon 10am"), hm(10, 0));
        assert_eq!(parse_schedule_time("Friday 2pm"), hm(14, 0));
        assert_eq!(parse_schedule_time("Sat 12pm"), hm(12, 0));
        assert_eq!(parse_schedule_time("Sat 12am"), hm(0, 0));
        assert_eq!(parse_schedule_time("Sat 12:15 AM"), hm(0, 15));
    }

    #[test]
    fn test_parse_without_meridiem() {
        assert_eq!(parse_schedule_time("Mon/Wed 13:00"), hm(13, 0));
        assert_eq!(parse_schedule_time("Wed 3:15"), hm(15, 15));
        assert_eq!(parse_schedule_time("Wed 6"), hm(18, 0));
        assert_eq!(parse_schedule_time("Wed 7:45"), hm(7, 45));
        assert_eq!(parse_schedule_time("Wed 12:00"), hm(12, 0));
        assert_eq!(parse_schedule_time("Wed 0:30"), hm(0, 30));
    }

    #[test]
    fn test_parse_no_match() {
        assert_eq!(parse_schedule_time("TBD"), None);
        assert_eq!(parse_schedule_time(""), None);
        assert_eq!(parse_schedule_time("Tue 99"), None);
        assert_eq!(parse_schedule_time("Tue 11pm"), hm(23, 0));
        assert_eq!(parse_schedule_time("Tue 13pm"), None);
    }

    #[test]
    fn test_day_matches() {
        assert!(day_matches("Tue/Thu 3:30 PM", "Tuesday"));
        assert!(day_matches("Tue/Thu 3:30 PM", "Thursday"));
        assert!(!day_matches("Tue/Thu 3:30 PM", "Wednesday"));
        assert!(day_matches("FRIDAY 2pm", "friday"));
        assert!(!day_matches("anything", ""));
    }

    #[test]
    fn test_occurs_at_respects_explicit_meridiem() {
        assert!(occurs_at("Friday 2pm", "Friday", 14));
        assert!(!occurs_at("Friday 2pm", "Friday", 2));
        assert!(!occurs_at("Friday 2pm", "Monday", 14));
        assert!(!occurs_at("Friday TBD", "Friday", 14));
    }

    #[test]
    fn test_parse_span() {
        let (start, duration) = parse_schedule_span("Tue/Thu 3:30 PM - 5:00 PM").unwrap();
        assert_eq!(start, ScheduleTime { hour: 15, minute: 30 });
        assert_eq!(duration, Some(90));

        let (_, duration) = parse_schedule_span("Tue/Thu 3:30 PM").unwrap();
        assert_eq!(duration, None);

        // second number is not an end time
        let (_, duration) = parse_schedule_span("Room 4, Tue 3pm").unwrap();
        assert_eq!(duration, None);
    }

    #[test]
    fn test_normalize_legacy() {
        let schedule = normalize_legacy("Tue/Thu 3:30 PM - 5:00 PM", 60).unwrap();
        assert_eq!(
            schedule,
            ClassSchedule::Timed {
                days: DaySet::from_days([Weekday::Tue, Weekday::Thu]),
                time: NaiveTime::from_hms_opt(15, 30, 0).unwrap(),
                duration_minutes: 90,
            }
        );

        let schedule = normalize_legacy("Mon 10am", 70).unwrap();
        match schedule {
            ClassSchedule::Timed { duration_minutes, .. } => assert_eq!(duration_minutes, 70),
            other => panic!("expected timed schedule, got {:?}", other),
        }

        assert_eq!(normalize_legacy("3pm", 60), None);
        assert_eq!(normalize_legacy("Tuesdays, time TBD", 60), None);
    }
}
