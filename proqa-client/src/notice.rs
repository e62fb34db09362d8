//! Timed failure notices
//!
//! Failed backend calls raise a short-lived notice the UI can show as a
//! banner. Expiry is evaluated on read, so no timer task is needed.

use chrono::{DateTime, Duration, Utc};
use tracing::error;

#[derive(Debug, Clone)]
struct Notice {
    text: String,
    raised_at: DateTime<Utc>,
}

/// Holds the most recent failure notice until it expires.
#[derive(Debug)]
pub struct NoticeBoard {
    ttl: Duration,
    current: Option<Notice>,
}

impl NoticeBoard {
    /// Create a board whose notices live for `ttl_seconds`.
    pub fn new(ttl_seconds: u64) -> Self {
        Self {
            ttl: Duration::seconds(ttl_seconds as i64),
            current: None,
        }
    }

    /// Raise a notice, replacing any previous one. Also logs it.
    pub fn raise(&mut self, text: impl Into<String>) {
        let text = text.into();
        error!("{}", text);
        self.current = Some(Notice {
            text,
            raised_at: Utc::now(),
        });
    }

    /// The current notice, or `None` once it has expired.
    pub fn current(&self) -> Option<&str> {
        let notice = self.current.as_ref()?;
        if Utc::now() - notice.raised_at > self.ttl {
            None
        } else {
            Some(&notice.text)
        }
    }

    /// Dismiss the current notice.
    pub fn clear(&mut self) {
        self.current = None;
    }
}

impl Default for NoticeBoard {
    fn default() -> Self {
        Self::new(10)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raise_and_read() {
        let mut board = NoticeBoard::new(10);
        assert!(board.current().is_none());

        board.raise("Could not retrieve chat sessions");
        assert_eq!(board.current(), Some("Could not retrieve chat sessions"));
    }

    #[test]
    fn test_clear() {
        let mut board = NoticeBoard::new(10);
        board.raise("something failed");
        board.clear();
        assert!(board.current().is_none());
    }

    #[test]
    fn test_expiry() {
        let mut board = NoticeBoard::new(0);
        board.raise("short-lived");
        // ttl of zero: anything older than "now" is expired
        std::thread::sleep(std::time::Duration::from_millis(5));
        assert!(board.current().is_none());
    }

    #[test]
    fn test_newer_notice_replaces_older() {
        let mut board = NoticeBoard::new(10);
        board.raise("first");
        board.raise("second");
        assert_eq!(board.current(), Some("second"));
    }
}
