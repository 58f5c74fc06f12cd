pub mod calendar_event;
pub mod class;
pub mod conflict;

pub use calendar_event::{CalendarEvent, CalendarEventDraft};
pub use class::{
    Class, ClassRow, ClassSchedule, ClassStatus, GridPlacement, NewClassRequest,
    PlaceClassRequest, ScheduleColumns, UnassignClassRequest, UpdateStatusRequest,
    DEFAULT_DURATION_MINUTES, MAX_DURATION_MINUTES,
};
pub use conflict::{ClassRef, ConflictAlert, Severity};
