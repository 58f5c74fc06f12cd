use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::db::ClassStore;
use crate::error::AppError;
use crate::models::{
    CalendarEvent, Class, ClassSchedule, ClassStatus, ConflictAlert, GridPlacement, NewClassRequest,
};
use crate::scheduling::conflict::{find_all_conflicts, find_conflict, grid_alert};
use crate::scheduling::legacy::normalize_legacy;
use crate::scheduling::materialize::{generate_events, EventDetails, RecurrenceConfig};

/// Server-side gate in front of every schedule write.
pub struct SchedulingService {
    store: Arc<dyn ClassStore>,
    default_duration: u32,
}

#[derive(Debug, Default, Serialize)]
pub struct BackfillStats {
    pub converted: usize,
    pub skipped: usize,
}

impl SchedulingService {
    pub fn new(store: Arc<dyn ClassStore>, default_duration: u32) -> Self {
        Self {
            store,
            default_duration,
        }
    }

    pub async fn list_classes(&self) -> Result<Vec<Class>, AppError> {
        self.store.list_active_classes().await
    }

    pub async fn create_class(&self, req: NewClassRequest) -> Result<Class, AppError> {
        if req.title.trim().is_empty() || req.teacher_id.trim().is_empty() {
            return Err(AppError::BadRequest(
                "title and teacher_id are required".to_string(),
            ));
        }
        req.schedule.validate().map_err(AppError::BadRequest)?;
        let placement = req.schedule.placement();
        if let Some(placement) = placement.filter(|_| req.status.is_schedulable()) {
            let draft = Class {
                id: Uuid::nil().to_string(),
                title: req.title.clone(),
                teacher_id: req.teacher_id.clone(),
                status: req.status,
                schedule: req.schedule.clone(),
                schedule_text: None,
                start_date: None,
                end_date: None,
                location: None,
                description: None,
                version: 0,
                updated_at: String::new(),
            };
            self.ensure_free(&draft, placement).await?;
        }

        let class = self.store.insert_class(req).await?;
        info!("Created class {} ({})", class.id, class.title);
        self.regenerate_events(&class).await?;
        Ok(class)
    }

    /// Overwrites a class with the given fields, still refusing grid double-bookings.
    /// An existing row is only overwritten at the version the caller last saw.
    pub async fn upsert_class(&self, class: Class) -> Result<Class, AppError> {
        class.schedule.validate().map_err(AppError::BadRequest)?;
        let placement = class.schedule.placement();
        if let Some(placement) = placement.filter(|_| class.status.is_schedulable()) {
            self.ensure_free(&class, placement).await?;
        }
        let saved = self.store.upsert_class(&class).await?;
        self.regenerate_events(&saved).await?;
        Ok(saved)
    }

    /// Status change; cancelling drops the class's events.
    pub async fn set_status(&self, class_id: &str, status: ClassStatus) -> Result<Class, AppError> {
        let class = self
            .store
            .find_class(class_id)
            .await?
            .ok_or(AppError::NotFound)?;
        info!("Class {} status {} -> {}", class_id, class.status, status);
        self.upsert_class(Class { status, ..class }).await
    }

    pub async fn place_class(
        &self,
        class_id: &str,
        placement: GridPlacement,
        expected_version: i64,
    ) -> Result<Class, AppError> {
        let class = self
            .store
            .find_class(class_id)
            .await?
            .ok_or(AppError::NotFound)?;
        self.ensure_free(&class, placement).await?;

        let saved = self
            .store
            .update_class_schedule(class_id, Some(placement), expected_version)
            .await?;
        info!(
            "Placed class {} at {} ({})",
            class_id, placement.block, placement.pattern
        );
        self.regenerate_events(&saved).await?;
        Ok(saved)
    }

    pub async fn unassign_class(
        &self,
        class_id: &str,
        expected_version: i64,
    ) -> Result<Class, AppError> {
        let saved = self
            .store
            .update_class_schedule(class_id, None, expected_version)
            .await?;
        info!("Unassigned class {}", class_id);
        self.regenerate_events(&saved).await?;
        Ok(saved)
    }

    async fn ensure_free(&self, class: &Class, placement: GridPlacement) -> Result<(), AppError> {
        let teacher_classes = self.store.list_teacher_classes(&class.teacher_id).await?;
        match find_conflict(
            &class.teacher_id,
            placement.pattern,
            placement.block,
            Some(&class.id),
            &teacher_classes,
        ) {
            Some(existing) => {
                let alert = grid_alert(class, placement.block, placement.pattern, existing);
                warn!("{}", alert.message);
                Err(AppError::ScheduleConflict(Box::new(alert)))
            }
            None => Ok(()),
        }
    }

    /// Materializes the class's schedule and swaps it in for the stored events.
    pub async fn regenerate_events(&self, class: &Class) -> Result<Vec<CalendarEvent>, AppError> {
        let config = RecurrenceConfig::for_class(class, self.default_duration);
        let drafts = generate_events(&class.id, &config, &EventDetails::for_class(class));
        debug!("Generated {} events for class {}", drafts.len(), class.id);
        self.store.replace_calendar_events(&class.id, &drafts).await
    }

    pub async fn regenerate_events_for(&self, class_id: &str) -> Result<Vec<CalendarEvent>, AppError> {
        let class = self
            .store
            .find_class(class_id)
            .await?
            .ok_or(AppError::NotFound)?;
        self.regenerate_events(&class).await
    }

    pub async fn list_events(&self, class_id: &str) -> Result<Vec<CalendarEvent>, AppError> {
        self.store
            .find_class(class_id)
            .await?
            .ok_or(AppError::NotFound)?;
        self.store.list_calendar_events(class_id).await
    }

    pub async fn teacher_conflicts(&self, teacher_id: &str) -> Result<Vec<ConflictAlert>, AppError> {
        let classes = self.store.list_teacher_classes(teacher_id).await?;
        Ok(find_all_conflicts(&classes, self.default_duration))
    }

    pub async fn all_conflicts(&self) -> Result<Vec<ConflictAlert>, AppError> {
        let classes = self.store.list_active_classes().await?;
        Ok(find_all_conflicts(&classes, self.default_duration))
    }

    /// Fills in structured recurrence fields for classes that only carry
    /// free text. Unreadable text is left alone.
    pub async fn backfill_legacy(&self) -> Result<BackfillStats, AppError> {
        let mut stats = BackfillStats::default();

        for class in self.store.list_active_classes().await? {
            let ClassSchedule::LegacyText { raw } = &class.schedule else {
                continue;
            };
            match normalize_legacy(raw, self.default_duration) {
                Some(schedule) => {
                    let saved = self
                        .store
                        .set_class_schedule(&class.id, &schedule, class.version)
                        .await?;
                    self.regenerate_events(&saved).await?;
                    stats.converted += 1;
                }
                None => {
                    warn!("Could not parse schedule '{}' of class {}", raw, class.id);
                    stats.skipped += 1;
                }
            }
        }

        info!(
            "Legacy backfill: {} converted, {} skipped",
            stats.converted, stats.skipped
        );
        Ok(stats)
    }
}
