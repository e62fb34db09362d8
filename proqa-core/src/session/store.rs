//! Session and message data structures

use serde::{Deserialize, Serialize};

/// Whether a session is shown in the normal list, pinned on top, or archived.
///
/// A session is archived when the backend reports it hidden. The enum keeps
/// "pinned and archived at the same time" unrepresentable; the backend
/// enforces the same rule by unpinning on hide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionStatus {
    Pinned,
    Normal,
    Archived,
}

impl SessionStatus {
    /// Decode the backend's `(hidden, pinned)` flag pair.
    ///
    /// Both flags set is invalid input and yields a `Session` error.
    pub fn from_flags(hidden: bool, pinned: bool) -> crate::Result<Self> {
        match (hidden, pinned) {
            (true, true) => Err(crate::Error::Session(
                "session cannot be both hidden and pinned".to_string(),
            )),
            (true, false) => Ok(SessionStatus::Archived),
            (false, true) => Ok(SessionStatus::Pinned),
            (false, false) => Ok(SessionStatus::Normal),
        }
    }

    /// Encode back into the backend's `(hidden, pinned)` flag pair.
    pub fn to_flags(self) -> (bool, bool) {
        match self {
            SessionStatus::Pinned => (false, true),
            SessionStatus::Normal => (false, false),
            SessionStatus::Archived => (true, false),
        }
    }
}

/// Rating attached to an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RatingState {
    Positive,
    Neutral,
    Negative,
}

impl RatingState {
    /// Decode the backend's integer encoding. Unknown values are neutral.
    pub fn from_score(score: i64) -> Self {
        match score {
            1 => RatingState::Positive,
            -1 => RatingState::Negative,
            _ => RatingState::Neutral,
        }
    }

    /// The backend's integer encoding of this state.
    pub fn score(self) -> i64 {
        match self {
            RatingState::Positive => 1,
            RatingState::Neutral => 0,
            RatingState::Negative => -1,
        }
    }

    /// Apply a requested rating to the current one.
    ///
    /// Requesting the already-active non-neutral state clears it back to
    /// neutral; requesting neutral always yields neutral.
    pub fn toggle(self, requested: RatingState) -> RatingState {
        match requested {
            RatingState::Neutral => RatingState::Neutral,
            RatingState::Positive if self == RatingState::Positive => RatingState::Neutral,
            RatingState::Positive => RatingState::Positive,
            RatingState::Negative if self == RatingState::Negative => RatingState::Neutral,
            RatingState::Negative => RatingState::Negative,
        }
    }
}

/// A chat session as shown in the session list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Backend-assigned session id
    pub id: String,
    /// Session title, derived from the first question
    pub title: String,
    /// Visibility/pin status
    pub status: SessionStatus,
    /// Caller-supplied color tag
    pub color: String,
}

impl Session {
    /// Create a new, normally-listed session.
    pub fn new(id: impl Into<String>, title: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            status: SessionStatus::Normal,
            color: color.into(),
        }
    }
}

/// Whether a message is a user question or a backend answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageKind {
    Question,
    Answer,
}

/// A source the backend consulted for an answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub name: String,
    pub link: String,
    pub context: String,
}

/// A message in a chat session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Message id; a local placeholder until the backend assigns one
    pub id: String,
    pub kind: MessageKind,
    pub content: String,
    /// Set while the message is in flight or its content is still arriving
    pub streaming: bool,
    #[serde(default)]
    pub sources: Vec<Source>,
    /// Only answers carry a rating
    #[serde(default)]
    pub rating: Option<RatingState>,
}

impl Message {
    /// Create a question message.
    pub fn question(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: MessageKind::Question,
            content: content.into(),
            streaming: false,
            sources: Vec::new(),
            rating: None,
        }
    }

    /// Create an empty answer message awaiting streamed content.
    pub fn answer(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: MessageKind::Answer,
            content: String::new(),
            streaming: false,
            sources: Vec::new(),
            rating: Some(RatingState::Neutral),
        }
    }

    /// Set the streaming flag.
    pub fn with_streaming(mut self, streaming: bool) -> Self {
        self.streaming = streaming;
        self
    }

    /// Attach a source.
    pub fn with_source(mut self, source: Source) -> Self {
        self.sources.push(source);
        self
    }
}

/// An entry in the frequently-asked-questions list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaqEntry {
    pub id: String,
    pub question: String,
    pub answer: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_from_flags() {
        assert_eq!(
            SessionStatus::from_flags(false, false).unwrap(),
            SessionStatus::Normal
        );
        assert_eq!(
            SessionStatus::from_flags(true, false).unwrap(),
            SessionStatus::Archived
        );
        assert_eq!(
            SessionStatus::from_flags(false, true).unwrap(),
            SessionStatus::Pinned
        );
        assert!(SessionStatus::from_flags(true, true).is_err());
    }

    #[test]
    fn test_status_flags_round_trip() {
        for status in [
            SessionStatus::Pinned,
            SessionStatus::Normal,
            SessionStatus::Archived,
        ] {
            let (hidden, pinned) = status.to_flags();
            assert_eq!(SessionStatus::from_flags(hidden, pinned).unwrap(), status);
        }
    }

    #[test]
    fn test_rating_from_score() {
        assert_eq!(RatingState::from_score(1), RatingState::Positive);
        assert_eq!(RatingState::from_score(0), RatingState::Neutral);
        assert_eq!(RatingState::from_score(-1), RatingState::Negative);
        // Anything else is neutral
        assert_eq!(RatingState::from_score(7), RatingState::Neutral);
    }

    #[test]
    fn test_rating_toggle() {
        use RatingState::{Negative, Neutral, Positive};

        // (current, requested, expected)
        let transitions = [
            (Neutral, Positive, Positive),
            (Neutral, Negative, Negative),
            (Neutral, Neutral, Neutral),
            (Positive, Positive, Neutral),
            (Positive, Negative, Negative),
            (Positive, Neutral, Neutral),
            (Negative, Positive, Positive),
            (Negative, Negative, Neutral),
            (Negative, Neutral, Neutral),
        ];
        for (current, requested, expected) in transitions {
            assert_eq!(current.toggle(requested), expected);
        }
    }

    #[test]
    fn test_answer_starts_neutral() {
        let answer = Message::answer("a-1").with_streaming(true);
        assert_eq!(answer.kind, MessageKind::Answer);
        assert_eq!(answer.rating, Some(RatingState::Neutral));
        assert!(answer.streaming);
        assert!(answer.content.is_empty());
    }
}
