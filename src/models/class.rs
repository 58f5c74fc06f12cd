use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::scheduling::pattern::{DaySet, ParseScheduleError, SchedulePattern, TimeBlock};

pub const DEFAULT_DURATION_MINUTES: u32 = 60;
pub const MAX_DURATION_MINUTES: u32 = 24 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassStatus {
    Draft,
    #[serde(alias = "active")]
    Published,
    Cancelled,
    Completed,
}

impl ClassStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClassStatus::Draft => "draft",
            ClassStatus::Published => "published",
            ClassStatus::Cancelled => "cancelled",
            ClassStatus::Completed => "completed",
        }
    }

    /// Cancelled classes are soft-excluded from conflict checks and materialization.
    pub fn is_schedulable(&self) -> bool {
        !matches!(self, ClassStatus::Cancelled)
    }
}

impl fmt::Display for ClassStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClassStatus {
    type Err = ParseScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "draft" => Ok(ClassStatus::Draft),
            "published" | "active" => Ok(ClassStatus::Published),
            "cancelled" => Ok(ClassStatus::Cancelled),
            "completed" => Ok(ClassStatus::Completed),
            _ => Err(ParseScheduleError {
                kind: "class status",
                value: s.to_string(),
            }),
        }
    }
}

/// Where a class sits on the (block x pattern) grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridPlacement {
    pub block: TimeBlock,
    pub pattern: SchedulePattern,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClassSchedule {
    Unscheduled,
    Grid {
        block: TimeBlock,
        pattern: SchedulePattern,
    },
    Timed {
        days: DaySet,
        time: NaiveTime,
        duration_minutes: u32,
    },
    LegacyText {
        raw: String,
    },
}

impl ClassSchedule {
    pub fn grid(block: TimeBlock, pattern: SchedulePattern) -> Self {
        ClassSchedule::Grid { block, pattern }
    }

    pub fn placement(&self) -> Option<GridPlacement> {
        match self {
            ClassSchedule::Grid { block, pattern } => Some(GridPlacement {
                block: *block,
                pattern: *pattern,
            }),
            _ => None,
        }
    }

    pub fn is_unscheduled(&self) -> bool {
        matches!(self, ClassSchedule::Unscheduled)
    }

    /// Rejects timed schedules that name no day or last outside 1..=1440 minutes.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            ClassSchedule::Timed { days, .. } if days.is_empty() => {
                Err("timed schedule needs at least one day".to_string())
            }
            ClassSchedule::Timed {
                duration_minutes, ..
            } if !(1..=MAX_DURATION_MINUTES).contains(duration_minutes) => Err(format!(
                "duration_minutes must be between 1 and {}, got {}",
                MAX_DURATION_MINUTES, duration_minutes
            )),
            _ => Ok(()),
        }
    }
}

impl From<Option<GridPlacement>> for ClassSchedule {
    fn from(placement: Option<GridPlacement>) -> Self {
        match placement {
            Some(p) => ClassSchedule::grid(p.block, p.pattern),
            None => ClassSchedule::Unscheduled,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Class {
    pub id: String,
    pub title: String,
    pub teacher_id: String,
    pub status: ClassStatus,
    pub schedule: ClassSchedule,
    /// Human-entered schedule text, kept alongside the structured fields.
    pub schedule_text: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub version: i64,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewClassRequest {
    pub title: String,
    pub teacher_id: String,
    #[serde(default = "default_status")]
    pub status: ClassStatus,
    #[serde(default = "default_schedule")]
    pub schedule: ClassSchedule,
    pub schedule_text: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub location: Option<String>,
    pub description: Option<String>,
}

fn default_status() -> ClassStatus {
    ClassStatus::Draft
}

fn default_schedule() -> ClassSchedule {
    ClassSchedule::Unscheduled
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceClassRequest {
    pub block: TimeBlock,
    pub pattern: SchedulePattern,
    pub version: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: ClassStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnassignClassRequest {
    pub version: i64,
}

/// Flat column layout of the `classes` table.
#[derive(Debug, Clone, FromRow)]
pub struct ClassRow {
    pub id: String,
    pub title: String,
    pub teacher_id: String,
    pub status: String,
    pub schedule_pattern: Option<String>,
    pub time_block: Option<String>,
    pub recurrence_days: Option<String>,
    pub recurrence_time: Option<String>,
    pub recurrence_duration: Option<i64>,
    pub schedule: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub version: i64,
    pub updated_at: String,
}

/// Structured schedule columns written for a `ClassSchedule`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScheduleColumns {
    pub schedule_pattern: Option<String>,
    pub time_block: Option<String>,
    pub recurrence_days: Option<String>,
    pub recurrence_time: Option<String>,
    pub recurrence_duration: Option<i64>,
}

impl From<&ClassSchedule> for ScheduleColumns {
    fn from(schedule: &ClassSchedule) -> Self {
        match schedule {
            ClassSchedule::Grid { block, pattern } => ScheduleColumns {
                schedule_pattern: Some(pattern.as_str().to_string()),
                time_block: Some(block.label().to_string()),
                ..Default::default()
            },
            ClassSchedule::Timed {
                days,
                time,
                duration_minutes,
            } => ScheduleColumns {
                recurrence_days: Some(
                    days.iter()
                        .map(crate::scheduling::pattern::weekday_name)
                        .collect::<Vec<_>>()
                        .join(","),
                ),
                recurrence_time: Some(time.format("%H:%M").to_string()),
                recurrence_duration: Some(i64::from(*duration_minutes)),
                ..Default::default()
            },
            ClassSchedule::Unscheduled | ClassSchedule::LegacyText { .. } => {
                ScheduleColumns::default()
            }
        }
    }
}

impl TryFrom<ClassRow> for Class {
    type Error = ParseScheduleError;

    fn try_from(row: ClassRow) -> Result<Self, Self::Error> {
        let schedule = schedule_from_columns(&row)?;
        Ok(Class {
            status: row.status.parse()?,
            id: row.id,
            title: row.title,
            teacher_id: row.teacher_id,
            schedule,
            schedule_text: row.schedule,
            start_date: row.start_date,
            end_date: row.end_date,
            location: row.location,
            description: row.description,
            version: row.version,
            updated_at: row.updated_at,
        })
    }
}

// Grid fields win over timed fields, which win over the free-text column.
fn schedule_from_columns(row: &ClassRow) -> Result<ClassSchedule, ParseScheduleError> {
    if let (Some(pattern), Some(block)) = (&row.schedule_pattern, &row.time_block) {
        return Ok(ClassSchedule::grid(block.parse()?, pattern.parse()?));
    }

    if let (Some(days), Some(time)) = (&row.recurrence_days, &row.recurrence_time) {
        let days = DaySet::parse_list(days);
        let time = NaiveTime::parse_from_str(time, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(time, "%H:%M:%S"))
            .map_err(|_| ParseScheduleError {
                kind: "recurrence time",
                value: time.clone(),
            })?;
        if !days.is_empty() {
            let duration_minutes = match row.recurrence_duration {
                None => DEFAULT_DURATION_MINUTES,
                Some(d) => u32::try_from(d)
                    .ok()
                    .filter(|d| (1..=MAX_DURATION_MINUTES).contains(d))
                    .ok_or_else(|| ParseScheduleError {
                        kind: "recurrence duration",
                        value: d.to_string(),
                    })?,
            };
            return Ok(ClassSchedule::Timed {
                days,
                time,
                duration_minutes,
            });
        }
    }

    match row.schedule.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => Ok(ClassSchedule::LegacyText {
            raw: raw.to_string(),
        }),
        _ => Ok(ClassSchedule::Unscheduled),
    }
}
