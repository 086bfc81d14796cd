pub mod file_storage;
pub mod migrate;
pub mod sqlite_storage;
pub mod storage;
pub mod store;
pub mod task;
pub mod views;

pub use file_storage::FileStorage;
pub use migrate::MigrationReport;
pub use sqlite_storage::SqliteStorage;
pub use storage::{
    MemoryStorage, StorageBackend, StoreError, StoreResult, KEY_NOTIFIED, KEY_TASKS, KEY_USER,
};
pub use store::TaskStore;
pub use task::{progress_from_steps, Priority, Step, Task, TaskDraft, TaskPatch};
