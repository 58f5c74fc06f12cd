use std::sync::Arc;

use sqlx::SqlitePool;

use crate::config::AppConfig;
use crate::db::{ClassStore, SqliteClassStore};
use crate::services::SchedulingService;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub store: Arc<dyn ClassStore>,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(db: SqlitePool, config: AppConfig) -> Self {
        let store = Arc::new(SqliteClassStore::new(db.clone()));
        Self { db, store, config }
    }

    pub fn scheduling(&self) -> SchedulingService {
        SchedulingService::new(self.store.clone(), self.config.default_duration_minutes)
    }
}
