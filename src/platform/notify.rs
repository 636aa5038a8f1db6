/// Blocking user notifications (alerts)

use std::sync::{Arc, Mutex};

pub trait Notifier: Send + Sync {
    /// Show `message` to the user. Never aborts the caller.
    fn alert(&self, message: &str);
}

/// Notifier that writes alerts to the log at warn level
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn alert(&self, message: &str) {
        log::warn!("{}", message);
    }
}

/// Notifier that keeps alerts in memory; clones share storage
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    messages: Arc<Mutex<Vec<String>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().map(|g| g.clone()).unwrap_or_default()
    }
}

impl Notifier for RecordingNotifier {
    fn alert(&self, message: &str) {
        if let Ok(mut g) = self.messages.lock() {
            g.push(message.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_notifier_keeps_messages_in_order() {
        let n = RecordingNotifier::new();
        let view = n.clone();
        n.alert("first");
        n.alert("second");
        assert_eq!(view.messages(), vec!["first", "second"]);
    }
}
