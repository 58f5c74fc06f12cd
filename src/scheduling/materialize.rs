use chrono::{Datelike, NaiveDate, Timelike};
use serde::{Deserialize, Serialize};

use crate::models::{CalendarEventDraft, Class, ClassSchedule};
use crate::scheduling::legacy::normalize_legacy;
use crate::scheduling::pattern::weekday_name;

/// Inputs the materializer needs; any missing piece means "not yet schedulable".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurrenceConfig {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// Weekday names, e.g. `Tuesday/Thursday`.
    pub day: Option<String>,
    pub block: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDetails {
    pub location: Option<String>,
    pub description: Option<String>,
}

impl EventDetails {
    pub fn for_class(class: &Class) -> Self {
        Self {
            location: class.location.clone(),
            description: class.description.clone(),
        }
    }
}

impl RecurrenceConfig {
    pub fn for_class(class: &Class, default_duration: u32) -> Self {
        if !class.status.is_schedulable() {
            return Self::default();
        }

        let structured = match &class.schedule {
            ClassSchedule::LegacyText { raw } => normalize_legacy(raw, default_duration),
            other => Some(other.clone()),
        };
        let (day, block) = match structured {
            Some(ClassSchedule::Grid { block, pattern }) => {
                (Some(pattern.day_spec()), Some(block.label().to_string()))
            }
            Some(ClassSchedule::Timed {
                days,
                time,
                duration_minutes,
            }) => {
                let start = time.hour() * 60 + time.minute();
                let end = start.saturating_add(duration_minutes);
                let span = format!(
                    "{:02}:{:02}-{:02}:{:02}",
                    start / 60,
                    start % 60,
                    (end / 60) % 24,
                    end % 60
                );
                (Some(days.to_spec()), Some(span))
            }
            _ => (None, None),
        };

        Self {
            start_date: class.start_date,
            end_date: class.end_date,
            day,
            block,
        }
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

/// Expands a recurrence into one draft per matching date of
/// `[start_date, end_date]`, ascending. Pure; callers replace the class's
/// previous events with the returned set.
pub fn generate_events(
    class_id: &str,
    config: &RecurrenceConfig,
    details: &EventDetails,
) -> Vec<CalendarEventDraft> {
    let (Some(start), Some(end), Some(day), Some(block)) = (
        config.start_date,
        config.end_date,
        non_blank(&config.day),
        non_blank(&config.block),
    ) else {
        return Vec::new();
    };
    if start > end {
        return Vec::new();
    }

    start
        .iter_days()
        .take_while(|date| *date <= end)
        .filter(|date| day.contains(weekday_name(date.weekday())))
        .map(|date| CalendarEventDraft {
            class_id: class_id.to_string(),
            date,
            block: block.to_string(),
            location: details.location.clone(),
            description: details.description.clone(),
        })
        .collect()
}
