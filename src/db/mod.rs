pub mod repository;
pub mod store;

pub use repository::VersionedUpdate;
pub use store::{ClassStore, SqliteClassStore};
