use async_trait::async_trait;
use sqlx::SqlitePool;
use tracing::warn;

use crate::db::repository::{self, VersionedUpdate};
use crate::error::AppError;
use crate::models::{
    CalendarEvent, CalendarEventDraft, Class, ClassSchedule, GridPlacement,
    NewClassRequest,
};

/// Persistence seam for the scheduling core. Each call is atomic.
#[async_trait]
pub trait ClassStore: Send + Sync {
    async fn list_active_classes(&self) -> Result<Vec<Class>, AppError>;
    async fn list_teacher_classes(&self, teacher_id: &str) -> Result<Vec<Class>, AppError>;
    async fn find_class(&self, class_id: &str) -> Result<Option<Class>, AppError>;
    async fn insert_class(&self, req: NewClassRequest) -> Result<Class, AppError>;

    /// Inserts, or overwrites at `class.version`; a stale version is rejected.
    async fn upsert_class(&self, class: &Class) -> Result<Class, AppError>;

    /// Compare-and-set on the class version; a stale version is rejected.
    async fn set_class_schedule(
        &self,
        class_id: &str,
        schedule: &ClassSchedule,
        expected_version: i64,
    ) -> Result<Class, AppError>;

    async fn update_class_schedule(
        &self,
        class_id: &str,
        placement: Option<GridPlacement>,
        expected_version: i64,
    ) -> Result<Class, AppError> {
        self.set_class_schedule(class_id, &ClassSchedule::from(placement), expected_version)
            .await
    }

    async fn replace_calendar_events(
        &self,
        class_id: &str,
        events: &[CalendarEventDraft],
    ) -> Result<Vec<CalendarEvent>, AppError>;

    async fn list_calendar_events(&self, class_id: &str) -> Result<Vec<CalendarEvent>, AppError>;
}

#[derive(Clone)]
pub struct SqliteClassStore {
    db: SqlitePool,
}

impl SqliteClassStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ClassStore for SqliteClassStore {
    async fn list_active_classes(&self) -> Result<Vec<Class>, AppError> {
        Ok(repository::fetch_active_classes(&self.db).await?)
    }

    async fn list_teacher_classes(&self, teacher_id: &str) -> Result<Vec<Class>, AppError> {
        Ok(repository::fetch_classes_by_teacher(&self.db, teacher_id).await?)
    }

    async fn find_class(&self, class_id: &str) -> Result<Option<Class>, AppError> {
        Ok(repository::find_class_by_id(&self.db, class_id).await?)
    }

    async fn insert_class(&self, req: NewClassRequest) -> Result<Class, AppError> {
        Ok(repository::insert_class(&self.db, req).await?)
    }

    async fn upsert_class(&self, class: &Class) -> Result<Class, AppError> {
        let outcome = repository::upsert_class(&self.db, class).await?;
        settle(&class.id, class.version, outcome)
    }

    async fn set_class_schedule(
        &self,
        class_id: &str,
        schedule: &ClassSchedule,
        expected_version: i64,
    ) -> Result<Class, AppError> {
        let outcome =
            repository::set_class_schedule(&self.db, class_id, schedule, expected_version).await?;
        settle(class_id, expected_version, outcome)
    }

    async fn replace_calendar_events(
        &self,
        class_id: &str,
        events: &[CalendarEventDraft],
    ) -> Result<Vec<CalendarEvent>, AppError> {
        Ok(repository::replace_calendar_events(&self.db, class_id, events).await?)
    }

    async fn list_calendar_events(&self, class_id: &str) -> Result<Vec<CalendarEvent>, AppError> {
        Ok(repository::fetch_events_for_class(&self.db, class_id).await?)
    }
}

fn settle(class_id: &str, expected_version: i64, outcome: VersionedUpdate) -> Result<Class, AppError> {
    match outcome {
        VersionedUpdate::Updated(class) => Ok(class),
        VersionedUpdate::Stale { current_version } => {
            warn!(
                "Rejected stale write for class {} (expected {}, current {})",
                class_id, expected_version, current_version
            );
            Err(AppError::StaleVersion {
                class_id: class_id.to_string(),
                expected: expected_version,
            })
        }
        VersionedUpdate::NotFound => Err(AppError::NotFound),
    }
}
