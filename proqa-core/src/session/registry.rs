//! In-memory registry of known sessions and their messages

use super::store::{Message, Session, SessionStatus};
use std::collections::HashMap;

/// Title shown when the active session has no registry entry.
const MISSING_TITLE: &str = "Title not found";

/// Tracks all sessions known to the user plus the active selection.
///
/// Sessions keep their list order: newly created sessions go to the front,
/// a full refresh replaces the list wholesale.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: Vec<Session>,
    active_id: Option<String>,
    active_title: String,
}

impl SessionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// All known sessions, in list order.
    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    /// Look up a session by id.
    pub fn get(&self, id: &str) -> Option<&Session> {
        self.sessions.iter().find(|s| s.id == id)
    }

    /// Look up a session by id, mutably.
    pub fn get_mut(&mut self, id: &str) -> Option<&mut Session> {
        self.sessions.iter_mut().find(|s| s.id == id)
    }

    /// Insert a session at the front of the list.
    ///
    /// An existing entry with the same id is replaced, never duplicated.
    pub fn insert_front(&mut self, session: Session) {
        self.sessions.retain(|s| s.id != session.id);
        self.sessions.insert(0, session);
    }

    /// Replace the whole list, mirroring a full history fetch.
    pub fn replace_all(&mut self, sessions: Vec<Session>) {
        self.sessions = sessions;
    }

    /// Update a session's status.
    pub fn set_status(&mut self, id: &str, status: SessionStatus) -> crate::Result<()> {
        match self.get_mut(id) {
            Some(session) => {
                session.status = status;
                Ok(())
            }
            None => Err(crate::Error::NotFound(format!("session {}", id))),
        }
    }

    /// Remove a session, returning it if present.
    ///
    /// Removing the active session clears the active selection.
    pub fn remove(&mut self, id: &str) -> Option<Session> {
        let index = self.sessions.iter().position(|s| s.id == id)?;
        let session = self.sessions.remove(index);
        if self.active_id.as_deref() == Some(id) {
            self.clear_active();
        }
        Some(session)
    }

    /// Make a session the active one and resolve its title.
    pub fn activate(&mut self, id: &str) {
        self.active_title = self
            .get(id)
            .map(|s| s.title.clone())
            .unwrap_or_else(|| MISSING_TITLE.to_string());
        self.active_id = Some(id.to_string());
    }

    /// Clear the active session and its title.
    pub fn clear_active(&mut self) {
        self.active_id = None;
        self.active_title.clear();
    }

    /// Id of the active session, if any.
    pub fn active_id(&self) -> Option<&str> {
        self.active_id.as_deref()
    }

    /// Title of the active session; empty when none is active.
    pub fn active_title(&self) -> &str {
        &self.active_title
    }
}

/// Ordered messages per session id.
#[derive(Debug, Default)]
pub struct MessageStore {
    messages: HashMap<String, Vec<Message>>,
}

impl MessageStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether any messages (possibly an empty list) are mirrored for this id.
    pub fn contains(&self, session_id: &str) -> bool {
        self.messages.contains_key(session_id)
    }

    /// Messages of a session, in conversation order.
    pub fn messages(&self, session_id: &str) -> Option<&[Message]> {
        self.messages.get(session_id).map(Vec::as_slice)
    }

    /// Replace a session's messages, mirroring a history fetch.
    pub fn replace(&mut self, session_id: impl Into<String>, messages: Vec<Message>) {
        self.messages.insert(session_id.into(), messages);
    }

    /// Append a message, creating the session entry on first use.
    pub fn push(&mut self, session_id: impl Into<String>, message: Message) {
        self.messages
            .entry(session_id.into())
            .or_default()
            .push(message);
    }

    /// Look up one message of a session, mutably.
    pub fn find_message_mut(&mut self, session_id: &str, message_id: &str) -> Option<&mut Message> {
        self.messages
            .get_mut(session_id)?
            .iter_mut()
            .find(|m| m.id == message_id)
    }

    /// Drop a session's messages.
    pub fn remove(&mut self, session_id: &str) -> Option<Vec<Message>> {
        self.messages.remove(session_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(id: &str, title: &str) -> Session {
        Session::new(id, title, "rgb(100,150,200)")
    }

    #[test]
    fn test_insert_front_orders_newest_first() {
        let mut registry = SessionRegistry::new();
        registry.insert_front(session("a", "first"));
        registry.insert_front(session("b", "second"));

        let ids: Vec<_> = registry.sessions().iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, ["b", "a"]);
    }

    #[test]
    fn test_insert_front_replaces_duplicate_id() {
        let mut registry = SessionRegistry::new();
        registry.insert_front(session("a", "old title"));
        registry.insert_front(session("a", "new title"));

        assert_eq!(registry.sessions().len(), 1);
        assert_eq!(registry.get("a").unwrap().title, "new title");
    }

    #[test]
    fn test_activate_resolves_title() {
        let mut registry = SessionRegistry::new();
        registry.insert_front(session("a", "Hello"));

        registry.activate("a");
        assert_eq!(registry.active_id(), Some("a"));
        assert_eq!(registry.active_title(), "Hello");

        registry.activate("unknown");
        assert_eq!(registry.active_title(), "Title not found");
    }

    #[test]
    fn test_remove_active_clears_selection() {
        let mut registry = SessionRegistry::new();
        registry.insert_front(session("a", "Hello"));
        registry.activate("a");

        let removed = registry.remove("a");
        assert!(removed.is_some());
        assert_eq!(registry.active_id(), None);
        assert_eq!(registry.active_title(), "");
    }

    #[test]
    fn test_remove_other_keeps_selection() {
        let mut registry = SessionRegistry::new();
        registry.insert_front(session("a", "Hello"));
        registry.insert_front(session("b", "World"));
        registry.activate("a");

        registry.remove("b");
        assert_eq!(registry.active_id(), Some("a"));
    }

    #[test]
    fn test_set_status_unknown_session() {
        let mut registry = SessionRegistry::new();
        let err = registry.set_status("nope", SessionStatus::Pinned).unwrap_err();
        assert!(err.to_string().contains("nope"));
    }

    #[test]
    fn test_store_push_creates_entry() {
        let mut store = MessageStore::new();
        assert!(!store.contains("s1"));

        store.push("s1", Message::question("q1", "hi"));
        assert!(store.contains("s1"));
        assert_eq!(store.messages("s1").unwrap().len(), 1);
    }

    #[test]
    fn test_store_replace_and_find() {
        let mut store = MessageStore::new();
        store.replace(
            "s1",
            vec![Message::question("q1", "hi"), Message::answer("a1")],
        );

        let answer = store.find_message_mut("s1", "a1").unwrap();
        answer.content.push_str("hello");
        assert_eq!(store.messages("s1").unwrap()[1].content, "hello");
        assert!(store.find_message_mut("s1", "missing").is_none());
        assert!(store.find_message_mut("missing", "a1").is_none());
    }

    #[test]
    fn test_store_empty_list_counts_as_mirrored() {
        let mut store = MessageStore::new();
        store.replace("s1", Vec::new());
        assert!(store.contains("s1"));
        assert!(store.messages("s1").unwrap().is_empty());
    }
}
