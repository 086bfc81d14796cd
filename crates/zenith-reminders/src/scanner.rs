//! Overdue reminder scanning.
//!
//! A periodic pass over the task store: any incomplete task whose due
//! instant has passed today gets exactly one notification, tracked in a
//! persisted id set so the alert never repeats, including across restarts.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use zenith_tasks::{StorageBackend, TaskStore, KEY_NOTIFIED};

use crate::notify::Notifier;

/// Persisted set of task ids already alerted as overdue.
pub struct NotifiedSet {
    storage: Arc<dyn StorageBackend>,
    ids: HashSet<String>,
}

impl NotifiedSet {
    /// Load the persisted id set. Missing or malformed data yields an empty
    /// set with a logged warning.
    pub fn load(storage: Arc<dyn StorageBackend>) -> Self {
        let ids = match storage.read(KEY_NOTIFIED) {
            Ok(Some(json)) => match serde_json::from_str::<Vec<String>>(&json) {
                Ok(ids) => ids.into_iter().collect(),
                Err(e) => {
                    tracing::warn!("Stored alert ledger is malformed, starting empty: {}", e);
                    HashSet::new()
                }
            },
            Ok(None) => HashSet::new(),
            Err(e) => {
                tracing::warn!("Failed to read alert ledger, starting empty: {}", e);
                HashSet::new()
            }
        };
        Self { storage, ids }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Record an id, persisting immediately so the alert stays one-shot
    /// across restarts.
    pub fn insert(&mut self, id: String) {
        if !self.ids.insert(id) {
            return;
        }
        self.persist();
    }

    fn persist(&self) {
        // Sorted for deterministic storage contents
        let mut ids: Vec<&String> = self.ids.iter().collect();
        ids.sort();
        match serde_json::to_string(&ids) {
            Ok(json) => {
                if let Err(e) = self.storage.write(KEY_NOTIFIED, &json) {
                    tracing::warn!("Failed to persist alert ledger: {}", e);
                }
            }
            Err(e) => tracing::warn!("Failed to serialize alert ledger: {}", e),
        }
    }
}

/// Periodic overdue check against the shared task store.
pub struct ReminderScanner {
    store: Arc<Mutex<TaskStore>>,
    notifier: Arc<dyn Notifier>,
    notified: NotifiedSet,
}

impl ReminderScanner {
    /// Build a scanner sharing the given store, loading the alert ledger
    /// from the same storage backend the store persists to.
    pub fn new(
        store: Arc<Mutex<TaskStore>>,
        notifier: Arc<dyn Notifier>,
        storage: Arc<dyn StorageBackend>,
    ) -> Self {
        Self {
            store,
            notifier,
            notified: NotifiedSet::load(storage),
        }
    }

    /// One scan pass at the given instant. Returns how many alerts were
    /// emitted.
    ///
    /// A task qualifies when it is incomplete, due on `now`'s calendar day,
    /// and its due instant has passed. Without granted permission nothing is
    /// emitted or recorded, so the same tasks fire as soon as permission
    /// arrives mid-session.
    pub fn tick(&mut self, now: DateTime<Utc>) -> usize {
        if !self.notifier.permission().is_granted() {
            return 0;
        }

        let today = now.date_naive();
        let due: Vec<(String, String)> = {
            let store = self.store.lock();
            store
                .tasks()
                .iter()
                .filter(|t| {
                    !t.is_completed && t.due_date.date_naive() == today && t.due_date < now
                })
                .map(|t| (t.id.clone(), t.title.clone()))
                .collect()
        };

        let mut emitted = 0;
        for (id, title) in due {
            if self.notified.contains(&id) {
                continue;
            }
            self.notifier.notify(
                "Task Overdue!",
                &format!("Your task \"{}\" is overdue.", title),
            );
            tracing::info!("Overdue alert emitted for task: {}", id);
            self.notified.insert(id);
            emitted += 1;
        }
        emitted
    }

    /// Run the scanner on a fixed cadence until cancelled.
    ///
    /// The first pass fires one full period after start. Ticks cannot
    /// overlap: each completes before the next is scheduled.
    pub fn spawn(mut self, period: Duration) -> ScannerHandle {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let task = tokio::spawn(async move {
            let start = tokio::time::Instant::now() + period;
            let mut ticker = tokio::time::interval_at(start, period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        self.tick(Utc::now());
                    }
                }
            }
            tracing::debug!("Reminder scanner stopped");
        });
        ScannerHandle { cancel, task }
    }
}

/// Handle for stopping a spawned scanner at teardown.
pub struct ScannerHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl ScannerHandle {
    /// Signal the scanner to stop without waiting for it.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Stop the scanner and wait for its task to drain.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            tracing::warn!("Reminder scanner task failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use crate::notify::Permission;
    use chrono::DateTime;
    use zenith_tasks::{MemoryStorage, Priority, TaskDraft};

    /// Notifier that records every alert and has a settable permission.
    struct RecordingNotifier {
        permission: Mutex<Permission>,
        alerts: Mutex<Vec<(String, String)>>,
    }

    impl RecordingNotifier {
        fn granted() -> Self {
            Self::with_permission(Permission::Granted)
        }

        fn with_permission(permission: Permission) -> Self {
            Self {
                permission: Mutex::new(permission),
                alerts: Mutex::new(Vec::new()),
            }
        }

        fn set_permission(&self, permission: Permission) {
            *self.permission.lock() = permission;
        }

        fn alerts(&self) -> Vec<(String, String)> {
            self.alerts.lock().clone()
        }
    }

    impl Notifier for RecordingNotifier {
        fn permission(&self) -> Permission {
            *self.permission.lock()
        }

        fn request_permission(&self) -> Permission {
            *self.permission.lock()
        }

        fn notify(&self, title: &str, body: &str) {
            self.alerts.lock().push((title.to_string(), body.to_string()));
        }
    }

    const NOW: &str = "2024-01-02T12:00:00Z";

    fn now() -> DateTime<Utc> {
        NOW.parse().unwrap()
    }

    fn draft(title: &str, due: &str) -> TaskDraft {
        TaskDraft {
            title: title.to_string(),
            description: String::new(),
            due_date: due.parse::<DateTime<Utc>>().unwrap(),
            priority: Priority::default(),
            steps: vec![],
            progress: 0,
        }
    }

    fn store_with(
        storage: &Arc<MemoryStorage>,
        drafts: Vec<TaskDraft>,
    ) -> Arc<Mutex<TaskStore>> {
        let storage: Arc<dyn StorageBackend> = storage.clone();
        let mut store = TaskStore::load(storage);
        for d in drafts {
            store.create(d);
        }
        Arc::new(Mutex::new(store))
    }

    #[test]
    fn test_overdue_today_fires_once() {
        let storage = Arc::new(MemoryStorage::new());
        let store = store_with(&storage, vec![draft("Pay rent", "2024-01-02T08:00:00Z")]);
        let notifier = Arc::new(RecordingNotifier::granted());

        let mut scanner = ReminderScanner::new(store, notifier.clone(), storage);

        assert_eq!(scanner.tick(now()), 1);
        let alerts = notifier.alerts();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].0, "Task Overdue!");
        assert_eq!(alerts[0].1, "Your task \"Pay rent\" is overdue.");

        // Same overdue window, no re-fire
        assert_eq!(scanner.tick(now()), 0);
        assert_eq!(notifier.alerts().len(), 1);
    }

    #[test]
    fn test_dedup_survives_restart() {
        let storage = Arc::new(MemoryStorage::new());
        let store = store_with(&storage, vec![draft("Pay rent", "2024-01-02T08:00:00Z")]);
        let notifier = Arc::new(RecordingNotifier::granted());

        let mut scanner =
            ReminderScanner::new(store.clone(), notifier.clone(), storage.clone());
        assert_eq!(scanner.tick(now()), 1);

        // A fresh scanner loads the persisted ledger
        let mut restarted = ReminderScanner::new(store, notifier.clone(), storage);
        assert_eq!(restarted.tick(now()), 0);
        assert_eq!(notifier.alerts().len(), 1);
    }

    #[test]
    fn test_not_yet_due_and_completed_are_skipped() {
        let storage = Arc::new(MemoryStorage::new());
        let store = store_with(
            &storage,
            vec![
                draft("Later today", "2024-01-02T18:00:00Z"),
                draft("Done already", "2024-01-02T08:00:00Z"),
            ],
        );
        {
            let mut locked = store.lock();
            let done_id = locked
                .tasks()
                .iter()
                .find(|t| t.title == "Done already")
                .map(|t| t.id.clone())
                .unwrap();
            locked.toggle_complete(&done_id);
        }
        let notifier = Arc::new(RecordingNotifier::granted());

        let mut scanner = ReminderScanner::new(store, notifier.clone(), storage);
        assert_eq!(scanner.tick(now()), 0);
        assert!(notifier.alerts().is_empty());
    }

    #[test]
    fn test_due_on_an_earlier_day_does_not_fire() {
        let storage = Arc::new(MemoryStorage::new());
        let store = store_with(&storage, vec![draft("Missed", "2024-01-01T08:00:00Z")]);
        let notifier = Arc::new(RecordingNotifier::granted());

        // Overdue, but its calendar day already passed
        let mut scanner = ReminderScanner::new(store, notifier.clone(), storage);
        assert_eq!(scanner.tick(now()), 0);
    }

    #[test]
    fn test_without_permission_nothing_is_recorded() {
        let storage = Arc::new(MemoryStorage::new());
        let store = store_with(&storage, vec![draft("Pay rent", "2024-01-02T08:00:00Z")]);
        let notifier = Arc::new(RecordingNotifier::with_permission(Permission::Denied));

        let mut scanner = ReminderScanner::new(store, notifier.clone(), storage);
        assert_eq!(scanner.tick(now()), 0);
        assert!(notifier.alerts().is_empty());
        assert!(scanner.notified.is_empty());

        // Permission granted mid-session: the alert fires on the next pass
        notifier.set_permission(Permission::Granted);
        assert_eq!(scanner.tick(now()), 1);
        assert_eq!(notifier.alerts().len(), 1);
    }

    #[test]
    fn test_ledger_ignores_malformed_data() {
        let storage = Arc::new(MemoryStorage::new());
        storage.write(KEY_NOTIFIED, "{broken").unwrap();
        let storage_dyn: Arc<dyn StorageBackend> = storage;
        let set = NotifiedSet::load(storage_dyn);
        assert!(set.is_empty());
    }

    #[tokio::test]
    async fn test_spawned_scanner_cancels_cleanly() {
        let storage = Arc::new(MemoryStorage::new());
        let store = store_with(&storage, vec![]);
        let notifier = Arc::new(RecordingNotifier::granted());

        let scanner = ReminderScanner::new(store, notifier, storage);
        let handle = scanner.spawn(Duration::from_millis(10));

        tokio::time::sleep(Duration::from_millis(35)).await;
        handle.shutdown().await;
    }
}
