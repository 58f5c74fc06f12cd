use chrono::{NaiveDate, NaiveTime, Weekday};

use class_scheduler::models::{Class, ClassSchedule, ClassStatus, Severity};
use class_scheduler::scheduling::{
    DaySet, EventDetails, RecurrenceConfig, SchedulePattern, TimeBlock, TimeRange,
    find_all_conflicts, find_conflict, generate_events, occurs_at, parse_schedule_time,
};

fn class(id: &str, teacher: &str, schedule: ClassSchedule) -> Class {
    Class {
        id: id.to_string(),
        title: format!("Class {}", id),
        teacher_id: teacher.to_string(),
        status: ClassStatus::Published,
        schedule,
        schedule_text: None,
        start_date: None,
        end_date: None,
        location: None,
        description: None,
        version: 1,
        updated_at: String::new(),
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn test_pattern_overlap_is_symmetric() {
    for a in SchedulePattern::ALL {
        for b in SchedulePattern::ALL {
            assert_eq!(a.overlaps(&b), b.overlaps(&a), "{} / {}", a, b);
        }
    }
    assert!(!SchedulePattern::TuTh.overlaps(&SchedulePattern::Wed));
    assert!(!SchedulePattern::Tu.overlaps(&SchedulePattern::Th));
    assert!(SchedulePattern::TuTh.overlaps(&SchedulePattern::Tu));
    assert!(SchedulePattern::Wed.overlaps(&SchedulePattern::Wed));
}

#[test]
fn test_conflict_detection_for_same_teacher() {
    let existing = vec![class(
        "existing",
        "T",
        ClassSchedule::grid(TimeBlock::Block2, SchedulePattern::TuTh),
    )];

    let hit = find_conflict("T", SchedulePattern::Tu, TimeBlock::Block2, Some("new"), &existing);
    assert_eq!(hit.map(|c| c.id.as_str()), Some("existing"));

    assert!(find_conflict("T", SchedulePattern::Wed, TimeBlock::Block2, Some("new"), &existing).is_none());
    assert!(find_conflict("T", SchedulePattern::TuTh, TimeBlock::Block3, Some("new"), &existing).is_none());
    assert!(find_conflict("U", SchedulePattern::TuTh, TimeBlock::Block2, Some("new"), &existing).is_none());
}

#[test]
fn test_materialization_dates() {
    let config = RecurrenceConfig {
        start_date: Some(date(2024, 1, 1)),
        end_date: Some(date(2024, 1, 14)),
        day: Some("Tuesday/Thursday".to_string()),
        block: Some("Block 1".to_string()),
    };
    let events = generate_events("c1", &config, &EventDetails::default());

    let dates: Vec<NaiveDate> = events.iter().map(|e| e.date).collect();
    assert_eq!(
        dates,
        vec![date(2024, 1, 2), date(2024, 1, 4), date(2024, 1, 9), date(2024, 1, 11)]
    );

    // identical inputs, identical output
    assert_eq!(events, generate_events("c1", &config, &EventDetails::default()));

    let reversed = RecurrenceConfig {
        start_date: Some(date(2024, 1, 14)),
        end_date: Some(date(2024, 1, 1)),
        ..config
    };
    assert!(generate_events("c1", &reversed, &EventDetails::default()).is_empty());
}

#[test]
fn test_legacy_time_parsing() {
    let t = parse_schedule_time("Tue/Thu 3:30 PM").expect("time");
    assert_eq!((t.hour, t.minute), (15, 30));

    assert_eq!(parse_schedule_time("Mon 10am").map(|t| t.hour), Some(10));
    assert_eq!(parse_schedule_time("Mon/Wed 13:00").map(|t| t.hour), Some(13));

    assert!(occurs_at("Friday 2pm", "Friday", 14));
    assert!(!occurs_at("Friday 2pm", "Friday", 2));
}

#[test]
fn test_numeric_time_range_overlap() {
    let timed = |hour, minute, duration| ClassSchedule::Timed {
        days: DaySet::from_days([Weekday::Mon, Weekday::Wed]),
        time: NaiveTime::from_hms_opt(hour, minute, 0).unwrap(),
        duration_minutes: duration,
    };

    let overlapping = vec![class("a", "T", timed(10, 0, 70)), class("b", "T", timed(10, 30, 60))];
    let alerts = find_all_conflicts(&overlapping, 60);
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].severity, Severity::High);

    let touching = vec![class("a", "T", timed(10, 0, 70)), class("b", "T", timed(11, 10, 60))];
    assert!(find_all_conflicts(&touching, 60).is_empty());

    assert!(TimeRange::from_start(600, 70).overlaps(&TimeRange::from_start(630, 60)));
    assert!(!TimeRange::from_start(600, 70).overlaps(&TimeRange::from_start(670, 60)));
}
