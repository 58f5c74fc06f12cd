//! Drag-and-drop scheduler board.
//!
//! Transitions are pure functions over an explicit [`BoardState`] that return
//! the next state plus the [`BoardCommand`] that persists it. [`SchedulerBoard`]
//! applies a transition optimistically, runs its command against the store and
//! puts the whole previous state back if the store refuses the write. Once the
//! write lands, the class's calendar events are rematerialized.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::db::ClassStore;
use crate::error::AppError;
use crate::models::{Class, ClassSchedule, ConflictAlert, GridPlacement};
use crate::scheduling::conflict::{find_conflict, grid_alert};
use crate::scheduling::materialize::{generate_events, EventDetails, RecurrenceConfig};
use crate::scheduling::pattern::{SchedulePattern, TimeBlock};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BoardState {
    pub classes: Vec<Class>,
}

impl BoardState {
    pub fn new(classes: Vec<Class>) -> Self {
        Self { classes }
    }

    pub fn class(&self, class_id: &str) -> Option<&Class> {
        self.classes.iter().find(|c| c.id == class_id)
    }

    /// Classes sitting in one grid cell.
    pub fn cell(&self, block: TimeBlock, pattern: SchedulePattern) -> Vec<&Class> {
        self.classes
            .iter()
            .filter(|c| c.schedule.placement() == Some(GridPlacement { block, pattern }))
            .collect()
    }

    pub fn unscheduled(&self) -> Vec<&Class> {
        self.classes
            .iter()
            .filter(|c| c.schedule.placement().is_none())
            .collect()
    }

    fn with_placement(&self, class_id: &str, placement: Option<GridPlacement>) -> Self {
        let mut next = self.clone();
        if let Some(class) = next.classes.iter_mut().find(|c| c.id == class_id) {
            class.schedule = ClassSchedule::from(placement);
        }
        next
    }
}

/// Side effect a transition asks the driver to perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardCommand {
    SaveSchedule {
        class_id: String,
        placement: Option<GridPlacement>,
        expected_version: i64,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoardError {
    #[error("class {0} is not on the board")]
    ClassNotFound(String),

    #[error("{}", .0.message)]
    Conflict(Box<ConflictAlert>),

    #[error("failed to save schedule change: {0}")]
    PersistFailed(String),
}

impl From<BoardError> for AppError {
    fn from(err: BoardError) -> Self {
        match err {
            BoardError::ClassNotFound(_) => AppError::NotFound,
            BoardError::Conflict(alert) => AppError::ScheduleConflict(alert),
            BoardError::PersistFailed(msg) => AppError::Conflict(msg),
        }
    }
}

/// Places `class_id` at (`to_block`, `to_pattern`) unless its teacher is
/// already booked in an overlapping cell.
pub fn move_class(
    state: &BoardState,
    class_id: &str,
    to_block: TimeBlock,
    to_pattern: SchedulePattern,
) -> Result<(BoardState, BoardCommand), BoardError> {
    let moving = state
        .class(class_id)
        .ok_or_else(|| BoardError::ClassNotFound(class_id.to_string()))?;

    if let Some(existing) = find_conflict(
        &moving.teacher_id,
        to_pattern,
        to_block,
        Some(class_id),
        &state.classes,
    ) {
        return Err(BoardError::Conflict(Box::new(grid_alert(
            moving, to_block, to_pattern, existing,
        ))));
    }

    let placement = Some(GridPlacement {
        block: to_block,
        pattern: to_pattern,
    });
    let command = BoardCommand::SaveSchedule {
        class_id: class_id.to_string(),
        placement,
        expected_version: moving.version,
    };
    Ok((state.with_placement(class_id, placement), command))
}

/// Clears a class's cell. Vacating a slot cannot create a conflict.
pub fn unassign_class(
    state: &BoardState,
    class_id: &str,
) -> Result<(BoardState, BoardCommand), BoardError> {
    let class = state
        .class(class_id)
        .ok_or_else(|| BoardError::ClassNotFound(class_id.to_string()))?;

    let command = BoardCommand::SaveSchedule {
        class_id: class_id.to_string(),
        placement: None,
        expected_version: class.version,
    };
    Ok((state.with_placement(class_id, None), command))
}

pub struct SchedulerBoard {
    state: BoardState,
    store: Arc<dyn ClassStore>,
    default_duration: u32,
}

impl SchedulerBoard {
    pub fn new(classes: Vec<Class>, store: Arc<dyn ClassStore>, default_duration: u32) -> Self {
        Self {
            state: BoardState::new(classes),
            store,
            default_duration,
        }
    }

    pub async fn load(store: Arc<dyn ClassStore>, default_duration: u32) -> Result<Self, AppError> {
        let classes = store.list_active_classes().await?;
        info!("Loaded scheduler board with {} classes", classes.len());
        Ok(Self::new(classes, store, default_duration))
    }

    pub fn state(&self) -> &BoardState {
        &self.state
    }

    pub async fn move_class(
        &mut self,
        class_id: &str,
        to_block: TimeBlock,
        to_pattern: SchedulePattern,
    ) -> Result<(), BoardError> {
        let (next, command) = move_class(&self.state, class_id, to_block, to_pattern)?;
        debug!("Moving class {} to {} ({})", class_id, to_block, to_pattern);
        self.commit(next, command).await
    }

    pub async fn unassign_class(&mut self, class_id: &str) -> Result<(), BoardError> {
        let (next, command) = unassign_class(&self.state, class_id)?;
        debug!("Unassigning class {}", class_id);
        self.commit(next, command).await
    }

    async fn commit(&mut self, next: BoardState, command: BoardCommand) -> Result<(), BoardError> {
        let snapshot = std::mem::replace(&mut self.state, next);

        match self.execute(&command).await {
            Ok(saved) => {
                // the schedule is stored; stale events can be regenerated later
                if let Err(e) = self.refresh_events(&saved).await {
                    warn!("Could not regenerate events for class {}: {}", saved.id, e);
                }
                if let Some(class) = self.state.classes.iter_mut().find(|c| c.id == saved.id) {
                    class.version = saved.version;
                    class.updated_at = saved.updated_at;
                }
                Ok(())
            }
            Err(e) => {
                warn!("Schedule change rolled back: {}", e);
                self.state = snapshot;
                Err(BoardError::PersistFailed(e.to_string()))
            }
        }
    }

    async fn refresh_events(&self, class: &Class) -> Result<(), AppError> {
        let config = RecurrenceConfig::for_class(class, self.default_duration);
        let drafts = generate_events(&class.id, &config, &EventDetails::for_class(class));
        debug!("Regenerating {} events for class {}", drafts.len(), class.id);
        self.store.replace_calendar_events(&class.id, &drafts).await?;
        Ok(())
    }

    async fn execute(&self, command: &BoardCommand) -> Result<Class, AppError> {
        match command {
            BoardCommand::SaveSchedule {
                class_id,
                placement,
                expected_version,
            } => {
                self.store
                    .update_class_schedule(class_id, *placement, *expected_version)
                    .await
            }
        }
    }
}
