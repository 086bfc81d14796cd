pub mod notify;
pub mod scanner;

pub use notify::{Notifier, Permission, TracingNotifier};
pub use scanner::{NotifiedSet, ReminderScanner, ScannerHandle};
