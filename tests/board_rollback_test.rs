use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::NaiveDate;

use class_scheduler::db::ClassStore;
use class_scheduler::error::AppError;
use class_scheduler::models::{
    CalendarEvent, CalendarEventDraft, Class, ClassSchedule, ClassStatus, NewClassRequest,
};
use class_scheduler::scheduling::{BoardError, SchedulePattern, SchedulerBoard, TimeBlock};

/// Store that keeps classes in memory and can be told to refuse writes.
struct MemoryStore {
    classes: Mutex<Vec<Class>>,
    events: Mutex<HashMap<String, Vec<CalendarEventDraft>>>,
    fail_writes: bool,
    writes: AtomicUsize,
}

impl MemoryStore {
    fn new(classes: Vec<Class>, fail_writes: bool) -> Self {
        Self {
            classes: Mutex::new(classes),
            events: Mutex::new(HashMap::new()),
            fail_writes,
            writes: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ClassStore for MemoryStore {
    async fn list_active_classes(&self) -> Result<Vec<Class>, AppError> {
        Ok(self.classes.lock().unwrap().clone())
    }

    async fn list_teacher_classes(&self, teacher_id: &str) -> Result<Vec<Class>, AppError> {
        Ok(self
            .classes
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.teacher_id == teacher_id)
            .cloned()
            .collect())
    }

    async fn find_class(&self, class_id: &str) -> Result<Option<Class>, AppError> {
        Ok(self.classes.lock().unwrap().iter().find(|c| c.id == class_id).cloned())
    }

    async fn insert_class(&self, _req: NewClassRequest) -> Result<Class, AppError> {
        Err(AppError::InternalServerError)
    }

    async fn upsert_class(&self, class: &Class) -> Result<Class, AppError> {
        Ok(class.clone())
    }

    async fn set_class_schedule(
        &self,
        class_id: &str,
        schedule: &ClassSchedule,
        expected_version: i64,
    ) -> Result<Class, AppError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes {
            return Err(AppError::InternalServerError);
        }
        let mut classes = self.classes.lock().unwrap();
        let class = classes
            .iter_mut()
            .find(|c| c.id == class_id)
            .ok_or(AppError::NotFound)?;
        if class.version != expected_version {
            return Err(AppError::StaleVersion {
                class_id: class_id.to_string(),
                expected: expected_version,
            });
        }
        class.schedule = schedule.clone();
        class.version += 1;
        class.updated_at = "2024-01-01T00:00:00+00:00".to_string();
        Ok(class.clone())
    }

    async fn replace_calendar_events(
        &self,
        class_id: &str,
        events: &[CalendarEventDraft],
    ) -> Result<Vec<CalendarEvent>, AppError> {
        self.events
            .lock()
            .unwrap()
            .insert(class_id.to_string(), events.to_vec());
        Ok(Vec::new())
    }

    async fn list_calendar_events(&self, _class_id: &str) -> Result<Vec<CalendarEvent>, AppError> {
        Ok(Vec::new())
    }
}

fn class(id: &str, teacher: &str, schedule: ClassSchedule) -> Class {
    Class {
        id: id.to_string(),
        title: format!("Class {}", id),
        teacher_id: teacher.to_string(),
        status: ClassStatus::Published,
        schedule,
        schedule_text: None,
        start_date: NaiveDate::from_ymd_opt(2024, 1, 1),
        end_date: NaiveDate::from_ymd_opt(2024, 1, 14),
        location: None,
        description: None,
        version: 1,
        updated_at: String::new(),
    }
}

fn seed() -> Vec<Class> {
    vec![
        class("a", "T", ClassSchedule::grid(TimeBlock::Block2, SchedulePattern::TuTh)),
        class("b", "T", ClassSchedule::Unscheduled),
        class("c", "U", ClassSchedule::grid(TimeBlock::Block4, SchedulePattern::Wed)),
    ]
}

#[tokio::test]
async fn test_failed_move_restores_snapshot() {
    let store = Arc::new(MemoryStore::new(seed(), true));
    let mut board = SchedulerBoard::load(store.clone(), 60).await.expect("load board");
    let before = board.state().clone();

    let err = board
        .move_class("b", TimeBlock::Block3, SchedulePattern::Wed)
        .await
        .unwrap_err();

    assert!(matches!(err, BoardError::PersistFailed(_)));
    assert!(err.to_string().starts_with("failed to save schedule change"));
    assert_eq!(board.state(), &before);
    assert_eq!(store.writes.load(Ordering::SeqCst), 1);
    assert!(store.events.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_failed_unassign_restores_snapshot() {
    let store = Arc::new(MemoryStore::new(seed(), true));
    let mut board = SchedulerBoard::load(store, 60).await.expect("load board");
    let before = board.state().clone();

    assert!(board.unassign_class("a").await.is_err());
    assert_eq!(board.state(), &before);
}

#[tokio::test]
async fn test_conflicting_move_never_reaches_store() {
    let store = Arc::new(MemoryStore::new(seed(), false));
    let mut board = SchedulerBoard::load(store.clone(), 60).await.expect("load board");
    let before = board.state().clone();

    let err = board
        .move_class("b", TimeBlock::Block2, SchedulePattern::Th)
        .await
        .unwrap_err();

    match err {
        BoardError::Conflict(alert) => {
            assert_eq!(alert.first.id, "a");
            assert_eq!(alert.teacher_id, "T");
        }
        other => panic!("expected conflict, got {:?}", other),
    }
    assert_eq!(board.state(), &before);
    assert_eq!(store.writes.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_successful_move_commits_and_tracks_version() {
    let store = Arc::new(MemoryStore::new(seed(), false));
    let mut board = SchedulerBoard::load(store.clone(), 60).await.expect("load board");

    board
        .move_class("b", TimeBlock::Block2, SchedulePattern::Wed)
        .await
        .expect("free cell");

    let moved = board.state().class("b").unwrap();
    assert_eq!(
        moved.schedule,
        ClassSchedule::grid(TimeBlock::Block2, SchedulePattern::Wed)
    );
    assert_eq!(moved.version, 2);

    // second move uses the bumped version and is accepted
    board
        .move_class("b", TimeBlock::Block5, SchedulePattern::Wed)
        .await
        .expect("free cell");
    assert_eq!(board.state().class("b").unwrap().version, 3);

    board.unassign_class("b").await.expect("unassign");
    assert_eq!(board.state().unscheduled().len(), 1);

    let stored = store.find_class("b").await.unwrap().unwrap();
    assert_eq!(stored.schedule, ClassSchedule::Unscheduled);
    // untouched classes keep their placement
    let other = store.find_class("c").await.unwrap().unwrap();
    assert_eq!(other.schedule.placement().map(|p| p.block), Some(TimeBlock::Block4));
}

#[tokio::test]
async fn test_board_moves_regenerate_events() {
    let store = Arc::new(MemoryStore::new(seed(), false));
    let mut board = SchedulerBoard::load(store.clone(), 60).await.expect("load board");

    board
        .move_class("b", TimeBlock::Block3, SchedulePattern::Wed)
        .await
        .expect("free cell");
    {
        let events = store.events.lock().unwrap();
        let drafts = &events["b"];
        let dates: Vec<NaiveDate> = drafts.iter().map(|d| d.date).collect();
        assert_eq!(
            dates,
            vec![
                NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(),
                NaiveDate::from_ymd_opt(2024, 1, 10).unwrap()
            ]
        );
        assert!(drafts.iter().all(|d| d.block == "Block 3"));
    }

    board
        .move_class("b", TimeBlock::Block1, SchedulePattern::Tu)
        .await
        .expect("free cell");
    {
        let events = store.events.lock().unwrap();
        let dates: Vec<NaiveDate> = events["b"].iter().map(|d| d.date).collect();
        assert_eq!(
            dates,
            vec![
                NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
                NaiveDate::from_ymd_opt(2024, 1, 9).unwrap()
            ]
        );
    }

    board.unassign_class("b").await.expect("unassign");
    assert!(store.events.lock().unwrap()["b"].is_empty());
}
