//! Notification capability port.
//!
//! The scanner only ever talks to this trait, so its logic is testable
//! without a real notification surface, and the process keeps working when
//! no surface exists at all.

use parking_lot::Mutex;

/// Permission state of the notification surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    /// No notification surface exists in this environment.
    Unsupported,
    /// The user has not been asked yet.
    NotRequested,
    Granted,
    Denied,
}

impl Permission {
    pub fn is_granted(self) -> bool {
        self == Permission::Granted
    }
}

/// Where overdue alerts go.
///
/// `notify` is fire-and-forget: no delivery confirmation, and it must not
/// block or fail the scanner.
pub trait Notifier: Send + Sync {
    /// Current permission state.
    fn permission(&self) -> Permission;

    /// Ask the user to allow notifications; returns the resulting state.
    ///
    /// Safe to call repeatedly: once granted or denied, the state sticks.
    fn request_permission(&self) -> Permission;

    /// Display a notification.
    fn notify(&self, title: &str, body: &str);
}

/// Notifier that writes alerts to the log.
///
/// Stand-in for a desktop notification surface; granting always succeeds
/// because the log is always available.
pub struct TracingNotifier {
    permission: Mutex<Permission>,
}

impl TracingNotifier {
    pub fn new() -> Self {
        Self {
            permission: Mutex::new(Permission::NotRequested),
        }
    }
}

impl Default for TracingNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier for TracingNotifier {
    fn permission(&self) -> Permission {
        *self.permission.lock()
    }

    fn request_permission(&self) -> Permission {
        let mut permission = self.permission.lock();
        if *permission == Permission::NotRequested {
            *permission = Permission::Granted;
        }
        *permission
    }

    fn notify(&self, title: &str, body: &str) {
        tracing::info!("{} {}", title, body);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracing_notifier_grants_on_request() {
        let notifier = TracingNotifier::new();
        assert_eq!(notifier.permission(), Permission::NotRequested);
        assert_eq!(notifier.request_permission(), Permission::Granted);
        assert!(notifier.permission().is_granted());
    }

    #[test]
    fn test_request_is_idempotent() {
        let notifier = TracingNotifier::new();
        notifier.request_permission();
        assert_eq!(notifier.request_permission(), Permission::Granted);
    }
}
