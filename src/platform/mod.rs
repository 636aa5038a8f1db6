//! Platform surface: where archives are saved and how alerts reach the user
//!
//! This module contains the public traits the studio uses to talk to its host
//! plus file-backed and in-memory implementations suitable for the CLI and
//! for tests.

pub mod notify;
pub mod save;

pub use notify::{LogNotifier, Notifier, RecordingNotifier};
pub use save::{DirectorySaveTarget, MemorySaveTarget, SaveTarget, SavedBlob};

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn surfaces_are_usable_as_trait_objects() {
        let save: Box<dyn SaveTarget> = Box::new(MemorySaveTarget::new());
        assert!(save.save("a.zip".into(), Vec::new()).await.is_ok());

        let recorder = RecordingNotifier::new();
        let notifier: Box<dyn Notifier> = Box::new(recorder.clone());
        notifier.alert("Big window");
        assert_eq!(recorder.messages(), vec!["Big window"]);
    }
}
