//! Integration tests for the guest quota against file backed storage

#[cfg(test)]
mod tests {
    use std::fs;

    use multichat::guest::storage::COUNT_KEY;
    use multichat::guest::{
        FileStorage, GuestConversation, GuestMessage, GuestQuotaTracker, GuestStores,
        ManualClock, QuotaConfig, StaticFingerprint, StoragePort,
    };
    use multichat::llm::Role;

    const NOW: i64 = 1_750_000_000_000;
    const DAY_MS: i64 = 24 * 60 * 60 * 1000;

    fn tracker(dir: &std::path::Path, clock: &ManualClock) -> GuestQuotaTracker {
        let mut tracker = GuestQuotaTracker::new(
            QuotaConfig::default(),
            GuestStores::in_dir(dir),
            StaticFingerprint("fp-cli".to_string()),
        )
        .with_clock(clock.clone());
        tracker.initialize();
        tracker
    }

    #[test]
    fn it_survives_restarts() {
        let dir = tempfile::tempdir().unwrap();
        let clock = ManualClock::new(NOW);

        let mut first = tracker(dir.path(), &clock);
        assert_eq!(first.increment(), 1);
        assert_eq!(first.increment(), 2);

        let second = tracker(dir.path(), &clock);
        assert_eq!(second.count(), 2);
        assert_eq!(second.remaining(), 1);
    }

    #[test]
    fn it_keeps_the_count_when_one_location_is_deleted() {
        let dir = tempfile::tempdir().unwrap();
        let clock = ManualClock::new(NOW);

        let mut first = tracker(dir.path(), &clock);
        for _ in 0..3 {
            first.increment();
        }
        assert!(!first.can_send());

        // Wipe local storage, the session and cookie files still remember
        fs::remove_file(dir.path().join("local.json")).unwrap();
        let second = tracker(dir.path(), &clock);
        assert_eq!(second.count(), 3);
        assert!(second.is_limit_reached());
    }

    #[test]
    fn it_forgets_expired_counts() {
        let dir = tempfile::tempdir().unwrap();
        let clock = ManualClock::new(NOW);

        let mut first = tracker(dir.path(), &clock);
        first.increment();
        first.increment();

        clock.advance(DAY_MS + 1);
        let second = tracker(dir.path(), &clock);
        assert_eq!(second.count(), 0);
        assert!(second.can_send());
    }

    #[test]
    fn it_clears_guest_state_on_sign_in() {
        let dir = tempfile::tempdir().unwrap();
        let clock = ManualClock::new(NOW);
        let session = dir.path().join("session.json");

        let mut quota = tracker(dir.path(), &clock);
        let mut conversation = GuestConversation::load(Box::new(FileStorage::new(&session)));
        conversation.add_message(GuestMessage::new("gpt-4.1-nano", Role::User, "Hi"));
        quota.increment();

        quota.reset_on_sign_in();
        conversation.clear();

        let local = FileStorage::new(dir.path().join("local.json"));
        assert_eq!(local.get(COUNT_KEY).unwrap(), None);
        let reloaded = GuestConversation::load(Box::new(FileStorage::new(&session)));
        assert!(reloaded.messages().is_empty());

        // Signing back out starts from what storage holds, which is nothing
        quota.force_reinitialize();
        assert_eq!(quota.count(), 0);
    }
}
