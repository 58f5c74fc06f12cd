use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One concrete dated occurrence of a class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct CalendarEvent {
    pub id: String,
    pub class_id: String,
    pub date: NaiveDate,
    pub block: String,
    pub location: Option<String>,
    pub description: Option<String>,
    pub created_at: String,
}

/// An event the materializer wants to exist; ids are assigned on insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEventDraft {
    pub class_id: String,
    pub date: NaiveDate,
    pub block: String,
    pub location: Option<String>,
    pub description: Option<String>,
}
