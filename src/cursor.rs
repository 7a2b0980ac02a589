//! Per-conversation read cursors and unread classification.
//!
//! The tracker keeps one "last seen" epoch-seconds timestamp per conversation,
//! in memory only. An unread scan both classifies and consumes: after the
//! batch is returned the conversation's cursor advances to now, so the same
//! batch is never handed out twice. Cursors only move forward.
//!
//! CHANGELOG:
//! - 08/27/2026 - Per-conversation scan extracted behind MessageView
//! - 08/26/2026 - Initial implementation

use std::collections::HashMap;

/// Minimal view of a message needed for unread classification.
///
/// Keeps the tracker decoupled from the host capture encoding; the gateway
/// adapts live message objects to this and tests use plain structs.
pub trait MessageView {
    /// Message timestamp, epoch seconds.
    fn timestamp(&self) -> i64;
    /// Authored by the local user.
    fn from_me(&self) -> bool;
    /// System/notification message (encryption notices etc).
    fn is_system(&self) -> bool;
}

/// Tracks the last-read boundary per conversation key.
///
/// Empty at startup; an absent entry behaves as minus infinity, so a
/// first-time query returns everything. Never persisted.
#[derive(Debug, Default)]
pub struct ReadCursorTracker {
    cursors: HashMap<String, i64>,
}

impl ReadCursorTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored cursor for a conversation, if any.
    pub fn cursor(&self, key: &str) -> Option<i64> {
        self.cursors.get(key).copied()
    }

    /// Number of conversations with a stored cursor.
    pub fn len(&self) -> usize {
        self.cursors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cursors.is_empty()
    }

    /// Set every known conversation's cursor to `now`.
    pub fn mark_all_read(&mut self, now: i64) {
        for cursor in self.cursors.values_mut() {
            *cursor = (*cursor).max(now);
        }
    }

    /// Advance one conversation's cursor to `now`, leaving others untouched.
    /// Cursors are monotonically non-decreasing.
    pub fn advance(&mut self, key: &str, now: i64) {
        let cursor = self.cursors.entry(key.to_string()).or_insert(i64::MIN);
        *cursor = (*cursor).max(now);
    }

    /// Classify the unread messages of one conversation and consume them.
    ///
    /// `messages` must be ordered newest-first; indices of unread messages are
    /// returned in that same order. System messages are skipped
    /// unconditionally. The scan terminates at the first message that is
    /// at-or-before the stored cursor or authored by the local user - a
    /// self-authored message is a known boundary marker, never unread.
    ///
    /// After the scan the conversation's cursor advances to `now`, so a given
    /// batch is returned at most once.
    pub fn unread_since<M: MessageView>(&mut self, key: &str, messages: &[M], now: i64) -> Vec<usize> {
        let cursor = self.cursor(key).unwrap_or(i64::MIN);

        let mut unread = Vec::new();
        for (idx, msg) in messages.iter().enumerate() {
            if msg.is_system() {
                continue;
            }
            if msg.timestamp() <= cursor || msg.from_me() {
                break;
            }
            unread.push(idx);
        }

        self.advance(key, now);
        unread
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestMsg {
        t: i64,
        from_me: bool,
        system: bool,
    }

    impl TestMsg {
        fn new(t: i64) -> Self {
            Self { t, from_me: false, system: false }
        }

        fn mine(t: i64) -> Self {
            Self { t, from_me: true, system: false }
        }

        fn system(t: i64) -> Self {
            Self { t, from_me: false, system: true }
        }
    }

    impl MessageView for TestMsg {
        fn timestamp(&self) -> i64 {
            self.t
        }
        fn from_me(&self) -> bool {
            self.from_me
        }
        fn is_system(&self) -> bool {
            self.system
        }
    }

    #[test]
    fn test_first_query_returns_all_foreign_messages() {
        // No stored cursor: every non-system, non-self message is unread.
        let mut tracker = ReadCursorTracker::new();
        let msgs = vec![TestMsg::new(300), TestMsg::system(200), TestMsg::new(100)];
        let unread = tracker.unread_since("alice", &msgs, 1000);
        assert_eq!(unread, vec![0, 2]);
    }

    #[test]
    fn test_batch_is_consumed() {
        // Second call in immediate succession with no new messages is empty.
        let mut tracker = ReadCursorTracker::new();
        let msgs = vec![TestMsg::new(300), TestMsg::new(100)];
        assert_eq!(tracker.unread_since("alice", &msgs, 1000), vec![0, 1]);
        assert_eq!(tracker.unread_since("alice", &msgs, 1001), Vec::<usize>::new());
    }

    #[test]
    fn test_self_message_is_boundary_not_unread() {
        // Self-authored message above the cursor still terminates the scan
        // and is never counted.
        let mut tracker = ReadCursorTracker::new();
        let msgs = vec![TestMsg::new(300), TestMsg::mine(250), TestMsg::new(200)];
        let unread = tracker.unread_since("alice", &msgs, 1000);
        assert_eq!(unread, vec![0]);
    }

    #[test]
    fn test_scan_stops_at_cursor() {
        let mut tracker = ReadCursorTracker::new();
        tracker.advance("alice", 150);
        let msgs = vec![TestMsg::new(300), TestMsg::new(150), TestMsg::new(100)];
        let unread = tracker.unread_since("alice", &msgs, 1000);
        assert_eq!(unread, vec![0]);
    }

    #[test]
    fn test_scenario_fresh_conversation_with_self_boundary() {
        // Newest-first: [{t:100, from them}, {t:50, from me}] -> only t:100,
        // and the cursor lands on now.
        let mut tracker = ReadCursorTracker::new();
        let msgs = vec![TestMsg::new(100), TestMsg::mine(50)];
        let unread = tracker.unread_since("alice", &msgs, 12345);
        assert_eq!(unread, vec![0]);
        assert_eq!(tracker.cursor("alice"), Some(12345));
    }

    #[test]
    fn test_per_conversation_isolation() {
        let mut tracker = ReadCursorTracker::new();
        tracker.advance("alice", 500);
        tracker.unread_since("bob", &[TestMsg::new(100)], 900);
        assert_eq!(tracker.cursor("alice"), Some(500));
        assert_eq!(tracker.cursor("bob"), Some(900));
    }

    #[test]
    fn test_cursor_is_monotonic() {
        let mut tracker = ReadCursorTracker::new();
        tracker.advance("alice", 500);
        tracker.advance("alice", 400);
        assert_eq!(tracker.cursor("alice"), Some(500));

        // mark_all_read with an older clock never rewinds either.
        tracker.mark_all_read(300);
        assert_eq!(tracker.cursor("alice"), Some(500));
    }

    #[test]
    fn test_mark_all_read() {
        let mut tracker = ReadCursorTracker::new();
        tracker.advance("alice", 10);
        tracker.advance("bob", 20);
        tracker.mark_all_read(999);
        assert_eq!(tracker.cursor("alice"), Some(999));
        assert_eq!(tracker.cursor("bob"), Some(999));
        // Only known conversations are touched.
        assert_eq!(tracker.cursor("carol"), None);
    }
}
