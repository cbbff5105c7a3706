use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// How long a typing indicator counts as active
pub const TYPING_TTL: Duration = Duration::from_secs(5);

/// Tracks who is typing in which channel. Entries expire after a fixed TTL.
pub struct TypingTracker {
    ttl: Duration,
    channels: Mutex<HashMap<String, HashMap<String, Instant>>>,
}

impl TypingTracker {
    pub fn new() -> Self {
        Self::with_ttl(TYPING_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl,
            channels: Mutex::new(HashMap::new()),
        }
    }

    pub fn record(&self, channel_id: &str, user_id: &str) {
        let Ok(mut channels) = self.channels.lock() else {
            tracing::warn!("Typing tracker lock poisoned");
            return;
        };
        self.prune(&mut channels);
        channels
            .entry(channel_id.to_string())
            .or_default()
            .insert(user_id.to_string(), Instant::now());
    }

    /// Users currently typing in a channel, sorted
    pub fn typing_in(&self, channel_id: &str) -> Vec<String> {
        let Ok(mut channels) = self.channels.lock() else {
            return Vec::new();
        };
        self.prune(&mut channels);

        let mut users: Vec<String> = channels
            .get(channel_id)
            .map(|users| users.keys().cloned().collect())
            .unwrap_or_default();
        users.sort();
        users
    }

    /// Number of channels with someone typing
    pub fn active_channels(&self) -> usize {
        let Ok(mut channels) = self.channels.lock() else {
            return 0;
        };
        self.prune(&mut channels);
        channels.len()
    }

    fn prune(&self, channels: &mut HashMap<String, HashMap<String, Instant>>) {
        let now = Instant::now();
        for users in channels.values_mut() {
            users.retain(|_, started| now.duration_since(*started) < self.ttl);
        }
        channels.retain(|_, users| !users.is_empty());
    }
}

impl Default for TypingTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_users_per_channel() {
        let tracker = TypingTracker::new();
        tracker.record("general", "bob");
        tracker.record("general", "alice");
        tracker.record("random", "carol");

        assert_eq!(tracker.typing_in("general"), vec!["alice", "bob"]);
        assert_eq!(tracker.typing_in("random"), vec!["carol"]);
        assert_eq!(tracker.active_channels(), 2);
    }

    #[test]
    fn test_entries_expire() {
        let tracker = TypingTracker::with_ttl(Duration::ZERO);
        tracker.record("general", "bob");

        assert!(tracker.typing_in("general").is_empty());
        assert_eq!(tracker.active_channels(), 0);
    }

    #[test]
    fn test_record_frees_expired_entries() {
        let tracker = TypingTracker::with_ttl(Duration::ZERO);
        for i in 0..1000 {
            tracker.record(&format!("channel-{}", i), "bob");
        }

        let channels = tracker.channels.lock().unwrap();
        assert!(channels.len() <= 1);
    }
}
