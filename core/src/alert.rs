//! User-facing alert side channel.

use tracing::warn;

/// Title used for every failure alert.
pub const ERROR_TITLE: &str = "Error";

/// Shows a short message to the user. Hosts wire this to their dialog
/// system; the messages are always generic, never raw server text.
pub trait Notifier: Send + Sync {
    fn alert(&self, title: &str, message: &str);
}

/// Notifier that only records the alert in the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn alert(&self, title: &str, message: &str) {
        warn!(title, message, "alert");
    }
}
