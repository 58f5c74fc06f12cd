use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::models::{
    CalendarEvent, CalendarEventDraft, Class, ClassRow, ClassSchedule, GridPlacement,
    NewClassRequest, ScheduleColumns,
};

const CLASS_COLUMNS: &str = "id, title, teacher_id, status, schedule_pattern, time_block, \
    recurrence_days, recurrence_time, recurrence_duration, schedule, start_date, end_date, \
    location, description, version, updated_at";

/// Outcome of a compare-and-set write on a class row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionedUpdate {
    Updated(Class),
    Stale { current_version: i64 },
    NotFound,
}

fn into_class(row: ClassRow) -> Result<Class, sqlx::Error> {
    Class::try_from(row).map_err(|e| sqlx::Error::Decode(Box::new(e)))
}

fn into_classes(rows: Vec<ClassRow>) -> Result<Vec<Class>, sqlx::Error> {
    rows.into_iter().map(into_class).collect()
}

/// Every class that is not cancelled, in insertion order.
pub async fn fetch_active_classes(db: &SqlitePool) -> Result<Vec<Class>, sqlx::Error> {
    let rows = sqlx::query_as::<_, ClassRow>(&format!(
        "SELECT {} FROM classes WHERE status != 'cancelled' ORDER BY rowid",
        CLASS_COLUMNS
    ))
    .fetch_all(db)
    .await?;
    into_classes(rows)
}

pub async fn fetch_classes_by_teacher(
    db: &SqlitePool,
    teacher_id: &str,
) -> Result<Vec<Class>, sqlx::Error> {
    let rows = sqlx::query_as::<_, ClassRow>(&format!(
        "SELECT {} FROM classes WHERE teacher_id = ? AND status != 'cancelled' ORDER BY rowid",
        CLASS_COLUMNS
    ))
    .bind(teacher_id)
    .fetch_all(db)
    .await?;
    into_classes(rows)
}

pub async fn find_class_by_id(db: &SqlitePool, id: &str) -> Result<Option<Class>, sqlx::Error> {
    sqlx::query_as::<_, ClassRow>(&format!(
        "SELECT {} FROM classes WHERE id = ?",
        CLASS_COLUMNS
    ))
    .bind(id)
    .fetch_optional(db)
    .await?
    .map(into_class)
    .transpose()
}

pub async fn insert_class(db: &SqlitePool, req: NewClassRequest) -> Result<Class, sqlx::Error> {
    let class = Class {
        id: Uuid::new_v4().to_string(),
        title: req.title,
        teacher_id: req.teacher_id,
        status: req.status,
        schedule: req.schedule,
        schedule_text: req.schedule_text,
        start_date: req.start_date,
        end_date: req.end_date,
        location: req.location,
        description: req.description,
        version: 1,
        updated_at: Utc::now().to_rfc3339(),
    };
    write_new_class(db, &class).await?;

    // LegacyText schedules live in the free-text column only
    find_class_by_id(db, &class.id)
        .await?
        .ok_or(sqlx::Error::RowNotFound)
}

async fn write_new_class(db: &SqlitePool, class: &Class) -> Result<(), sqlx::Error> {
    let cols = ScheduleColumns::from(&class.schedule);
    let schedule_text = legacy_text(class);

    sqlx::query(
        r#"
        INSERT INTO classes
            (id, title, teacher_id, status, schedule_pattern, time_block,
            recurrence_days, recurrence_time, recurrence_duration, schedule,
            start_date, end_date, location, description, version, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
        "#,
    )
    .bind(&class.id)
    .bind(&class.title)
    .bind(&class.teacher_id)
    .bind(class.status.as_str())
    .bind(cols.schedule_pattern)
    .bind(cols.time_block)
    .bind(cols.recurrence_days)
    .bind(cols.recurrence_time)
    .bind(cols.recurrence_duration)
    .bind(schedule_text)
    .bind(class.start_date)
    .bind(class.end_date)
    .bind(&class.location)
    .bind(&class.description)
    .bind(class.version)
    .bind(&class.updated_at)
    .execute(db)
    .await?;

    Ok(())
}

fn legacy_text(class: &Class) -> Option<String> {
    match &class.schedule {
        ClassSchedule::LegacyText { raw } => Some(raw.clone()),
        _ => class.schedule_text.clone(),
    }
}

/// Inserts a class, or overwrites the existing row if it is still at
/// `class.version`. An explicit `Unscheduled` clears the free-text column.
pub async fn upsert_class(db: &SqlitePool, class: &Class) -> Result<VersionedUpdate, sqlx::Error> {
    if find_class_by_id(db, &class.id).await?.is_none() {
        write_new_class(db, class).await?;
        return versioned_outcome(db, &class.id, 1).await;
    }

    let cols = ScheduleColumns::from(&class.schedule);
    let schedule_text = match class.schedule {
        ClassSchedule::Unscheduled => None,
        _ => legacy_text(class),
    };
    let now = Utc::now().to_rfc3339();
    let affected = sqlx::query(
        r#"
        UPDATE classes
        SET title = ?, teacher_id = ?, status = ?, schedule_pattern = ?, time_block = ?,
            recurrence_days = ?, recurrence_time = ?, recurrence_duration = ?, schedule = ?,
            start_date = ?, end_date = ?, location = ?, description = ?,
            version = version + 1, updated_at = ?
        WHERE id = ? AND version = ?
        "#,
    )
    .bind(&class.title)
    .bind(&class.teacher_id)
    .bind(class.status.as_str())
    .bind(cols.schedule_pattern)
    .bind(cols.time_block)
    .bind(cols.recurrence_days)
    .bind(cols.recurrence_time)
    .bind(cols.recurrence_duration)
    .bind(schedule_text)
    .bind(class.start_date)
    .bind(class.end_date)
    .bind(&class.location)
    .bind(&class.description)
    .bind(now)
    .bind(&class.id)
    .bind(class.version)
    .execute(db)
    .await?
    .rows_affected();

    versioned_outcome(db, &class.id, affected).await
}

async fn versioned_outcome(
    db: &SqlitePool,
    class_id: &str,
    affected: u64,
) -> Result<VersionedUpdate, sqlx::Error> {
    Ok(match (affected, find_class_by_id(db, class_id).await?) {
        (_, None) => VersionedUpdate::NotFound,
        (0, Some(class)) => VersionedUpdate::Stale {
            current_version: class.version,
        },
        (_, Some(class)) => VersionedUpdate::Updated(class),
    })
}

/// Writes the structured schedule columns if the row is still at
/// `expected_version`.
///
/// Grid and timed writes keep the free-text column for reference. `Unscheduled`
/// clears it so the row does not fall back to the old text, and `LegacyText`
/// replaces it.
pub async fn set_class_schedule(
    db: &SqlitePool,
    class_id: &str,
    schedule: &ClassSchedule,
    expected_version: i64,
) -> Result<VersionedUpdate, sqlx::Error> {
    let cols = ScheduleColumns::from(schedule);
    let (replace_text, schedule_text) = match schedule {
        ClassSchedule::Unscheduled => (true, None),
        ClassSchedule::LegacyText { raw } => (true, Some(raw.clone())),
        _ => (false, None),
    };
    let now = Utc::now().to_rfc3339();

    let affected = sqlx::query(
        r#"
        UPDATE classes
        SET schedule_pattern = ?1,
            time_block = ?2,
            recurrence_days = ?3,
            recurrence_time = ?4,
            recurrence_duration = ?5,
            schedule = CASE WHEN ?9 THEN ?10 ELSE schedule END,
            version = version + 1,
            updated_at = ?6
        WHERE id = ?7 AND version = ?8
        "#,
    )
    .bind(cols.schedule_pattern)
    .bind(cols.time_block)
    .bind(cols.recurrence_days)
    .bind(cols.recurrence_time)
    .bind(cols.recurrence_duration)
    .bind(now)
    .bind(class_id)
    .bind(expected_version)
    .bind(replace_text)
    .bind(schedule_text)
    .execute(db)
    .await?
    .rows_affected();

    versioned_outcome(db, class_id, affected).await
}

pub async fn update_class_schedule(
    db: &SqlitePool,
    class_id: &str,
    placement: Option<GridPlacement>,
    expected_version: i64,
) -> Result<VersionedUpdate, sqlx::Error> {
    set_class_schedule(db, class_id, &ClassSchedule::from(placement), expected_version).await
}

/// Replaces all events of a class with `drafts` in one transaction.
pub async fn replace_calendar_events(
    db: &SqlitePool,
    class_id: &str,
    drafts: &[CalendarEventDraft],
) -> Result<Vec<CalendarEvent>, sqlx::Error> {
    let mut tx = db.begin().await?;

    sqlx::query("DELETE FROM calendar_events WHERE class_id = ?")
        .bind(class_id)
        .execute(&mut *tx)
        .await?;

    let now = Utc::now().to_rfc3339();
    let mut events = Vec::with_capacity(drafts.len());
    for draft in drafts {
        let event = CalendarEvent {
            id: Uuid::new_v4().to_string(),
            class_id: class_id.to_string(),
            date: draft.date,
            block: draft.block.clone(),
            location: draft.location.clone(),
            description: draft.description.clone(),
            created_at: now.clone(),
        };
        sqlx::query(
            r#"
            INSERT INTO calendar_events
                (id, class_id, date, block, location, description, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&event.id)
        .bind(&event.class_id)
        .bind(event.date)
        .bind(&event.block)
        .bind(&event.location)
        .bind(&event.description)
        .bind(&event.created_at)
        .execute(&mut *tx)
        .await?;
        events.push(event);
    }

    tx.commit().await?;
    Ok(events)
}

pub async fn fetch_events_for_class(
    db: &SqlitePool,
    class_id: &str,
) -> Result<Vec<CalendarEvent>, sqlx::Error> {
    sqlx::query_as::<_, CalendarEvent>(
        "SELECT id, class_id, date, block, location, description, created_at \
         FROM calendar_events WHERE class_id = ? ORDER BY date",
    )
    .bind(class_id)
    .fetch_all(db)
    .await
}
