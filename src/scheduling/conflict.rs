use std::collections::BTreeMap;

use chrono::Timelike;

use crate::models::{Class, ClassRef, ClassSchedule, ConflictAlert, Severity};
use crate::scheduling::legacy::normalize_legacy;
use crate::scheduling::pattern::{DaySet, SchedulePattern, TimeBlock};

/// Half-open span of minutes within a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: u32,
    pub end: u32,
}

impl TimeRange {
    pub fn from_start(start_minute: u32, duration_minutes: u32) -> Self {
        Self {
            start: start_minute,
            end: start_minute.saturating_add(duration_minutes),
        }
    }

    /// A class ending at 10:00 does not collide with one starting at 10:00.
    pub fn overlaps(&self, other: &TimeRange) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// First class in `classes` that would collide with placing a class of
/// `teacher_id` at (`block`, `pattern`). Scans in input order.
pub fn find_conflict<'a>(
    teacher_id: &str,
    pattern: SchedulePattern,
    block: TimeBlock,
    exclude_class_id: Option<&str>,
    classes: &'a [Class],
) -> Option<&'a Class> {
    classes.iter().find(|class| {
        if !class.status.is_schedulable() || class.teacher_id != teacher_id {
            return false;
        }
        if exclude_class_id.is_some_and(|id| id == class.id) {
            return false;
        }
        class
            .schedule
            .placement()
            .is_some_and(|p| p.block == block && p.pattern.overlaps(&pattern))
    })
}

/// Alert describing a rejected grid move of `moving` onto `existing`.
pub fn grid_alert(
    moving: &Class,
    block: TimeBlock,
    pattern: SchedulePattern,
    existing: &Class,
) -> ConflictAlert {
    let existing_pattern = existing
        .schedule
        .placement()
        .map(|p| p.pattern.to_string())
        .unwrap_or_default();
    ConflictAlert {
        message: format!(
            "Teacher {} already teaches '{}' in {} ({}); '{}' cannot be placed at {} ({})",
            existing.teacher_id,
            existing.title,
            block,
            existing_pattern,
            moving.title,
            block,
            pattern
        ),
        severity: Severity::High,
        teacher_id: existing.teacher_id.clone(),
        first: ClassRef::from(existing),
        second: ClassRef::from(moving),
    }
}

struct TimedSlot {
    days: DaySet,
    range: TimeRange,
    from_legacy: bool,
}

fn timed_slot(class: &Class, default_duration: u32) -> Option<TimedSlot> {
    let (schedule, from_legacy) = match &class.schedule {
        ClassSchedule::LegacyText { raw } => (normalize_legacy(raw, default_duration)?, true),
        other => (other.clone(), false),
    };
    match schedule {
        ClassSchedule::Timed {
            days,
            time,
            duration_minutes,
        } => Some(TimedSlot {
            days,
            range: TimeRange::from_start(time.hour() * 60 + time.minute(), duration_minutes),
            from_legacy,
        }),
        _ => None,
    }
}

fn format_minutes(minute: u32) -> String {
    format!("{:02}:{:02}", minute / 60, minute % 60)
}

fn check_pair(a: &Class, b: &Class, default_duration: u32) -> Option<ConflictAlert> {
    if let (Some(pa), Some(pb)) = (a.schedule.placement(), b.schedule.placement()) {
        if pa.block != pb.block || !pa.pattern.overlaps(&pb.pattern) {
            return None;
        }
        return Some(ConflictAlert {
            message: format!(
                "Teacher {} is double-booked in {}: '{}' ({}) and '{}' ({})",
                a.teacher_id, pa.block, a.title, pa.pattern, b.title, pb.pattern
            ),
            severity: Severity::High,
            teacher_id: a.teacher_id.clone(),
            first: ClassRef::from(a),
            second: ClassRef::from(b),
        });
    }

    let sa = timed_slot(a, default_duration)?;
    let sb = timed_slot(b, default_duration)?;
    if !sa.days.intersects(&sb.days) || !sa.range.overlaps(&sb.range) {
        return None;
    }
    let severity = if sa.from_legacy || sb.from_legacy {
        Severity::Medium
    } else {
        Severity::High
    };
    Some(ConflictAlert {
        message: format!(
            "Teacher {} has overlapping classes: '{}' ({}-{}) and '{}' ({}-{})",
            a.teacher_id,
            a.title,
            format_minutes(sa.range.start),
            format_minutes(sa.range.end),
            b.title,
            format_minutes(sb.range.start),
            format_minutes(sb.range.end)
        ),
        severity,
        teacher_id: a.teacher_id.clone(),
        first: ClassRef::from(a),
        second: ClassRef::from(b),
    })
}

/// Every pairwise collision among non-cancelled classes, teacher by teacher.
///
/// Grid classes are compared by block and pattern; timed classes (including
/// legacy text the parser can read) by day intersection and half-open time
/// overlap. A grid class is never compared against a timed one, since blocks
/// carry no clock times.
pub fn find_all_conflicts(classes: &[Class], default_duration: u32) -> Vec<ConflictAlert> {
    let mut by_teacher: BTreeMap<&str, Vec<&Class>> = BTreeMap::new();
    for class in classes.iter().filter(|c| c.status.is_schedulable()) {
        by_teacher.entry(class.teacher_id.as_str()).or_default().push(class);
    }

    let mut alerts = Vec::new();
    for teacher_classes in by_teacher.values() {
        for (i, a) in teacher_classes.iter().enumerate() {
            for b in &teacher_classes[i + 1..] {
                if let Some(alert) = check_pair(a, b, default_duration) {
                    alerts.push(alert);
                }
            }
        }
    }
    alerts
}
