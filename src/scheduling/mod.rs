pub mod board;
pub mod conflict;
pub mod legacy;
pub mod materialize;
pub mod pattern;

pub use board::{BoardCommand, BoardError, BoardState, SchedulerBoard};
pub use conflict::{find_all_conflicts, find_conflict, TimeRange};
pub use legacy::{day_matches, normalize_legacy, occurs_at, parse_schedule_time, ScheduleTime};
pub use materialize::{generate_events, EventDetails, RecurrenceConfig};
pub use pattern::{DaySet, SchedulePattern, TimeBlock};
