//! Chat manager: mirrors remote session and message state
//!
//! All operations call the backend and keep the in-memory mirror
//! consistent with the outcome. Failures never panic; they are logged and
//! raised on the notice board for the UI to show.

use crate::api::{ApiClient, MessageRecord};
use crate::notice::NoticeBoard;
use crate::stream::AnswerEvent;
use proqa_core::config::ChatConfig;
use proqa_core::session::{
    FaqEntry, Message, MessageKind, MessageStore, RatingState, Session, SessionRegistry,
    SessionStatus, Source,
};
use proqa_core::utils::truncate_title;
use tracing::{debug, error, trace};
use uuid::Uuid;

/// Owns the session registry, message store, and FAQ list, and keeps them
/// mirrored against the backend.
pub struct ChatManager {
    api: ApiClient,
    registry: SessionRegistry,
    store: MessageStore,
    faq: Vec<FaqEntry>,
    notices: NoticeBoard,
    pending_deletion: Option<String>,
    title_max_chars: usize,
}

impl ChatManager {
    /// Create a manager with default chat settings.
    pub fn new(api: ApiClient) -> Self {
        Self::with_config(api, &ChatConfig::default())
    }

    /// Create a manager with the given chat settings.
    pub fn with_config(api: ApiClient, config: &ChatConfig) -> Self {
        Self {
            api,
            registry: SessionRegistry::new(),
            store: MessageStore::new(),
            faq: Vec::new(),
            notices: NoticeBoard::new(config.notice_ttl_seconds),
            pending_deletion: None,
            title_max_chars: config.title_max_chars,
        }
    }

    /// All known sessions, in list order.
    pub fn sessions(&self) -> &[Session] {
        self.registry.sessions()
    }

    /// Look up one session.
    pub fn session(&self, session_id: &str) -> Option<&Session> {
        self.registry.get(session_id)
    }

    /// Mirrored messages of a session, if fetched.
    pub fn messages(&self, session_id: &str) -> Option<&[Message]> {
        self.store.messages(session_id)
    }

    /// Id of the active session, if any.
    pub fn active_session_id(&self) -> Option<&str> {
        self.registry.active_id()
    }

    /// Title of the active session; empty when none is active.
    pub fn active_title(&self) -> &str {
        self.registry.active_title()
    }

    /// Mirrored FAQ entries.
    pub fn faq(&self) -> &[FaqEntry] {
        &self.faq
    }

    /// Current failure notice, if one is alive.
    pub fn notice(&self) -> Option<&str> {
        self.notices.current()
    }

    /// Dismiss the current failure notice.
    pub fn clear_notice(&mut self) {
        self.notices.clear();
    }

    /// Log a backend failure and raise a notice for the UI.
    fn fail(&mut self, text: impl Into<String>, err: impl std::fmt::Display) {
        error!("{}", err);
        self.notices.raise(text);
    }

    /// Make a session the active one, fetching its messages if they are
    /// not mirrored yet. A session whose (possibly empty) message list is
    /// already mirrored is not refetched.
    pub async fn activate_session(&mut self, session_id: &str) {
        self.registry.activate(session_id);

        if self.store.contains(session_id) {
            return;
        }

        match self.api.session_messages(session_id).await {
            Ok(records) => {
                let messages = records.into_iter().map(message_from_record).collect();
                self.store.replace(session_id, messages);
            }
            Err(err) => self.fail(
                format!(
                    "Could not retrieve chat messages for chat: {}",
                    session_id
                ),
                err,
            ),
        }
    }

    /// Clear the active session so a new one can be started.
    pub fn clear_active_session(&mut self) {
        self.registry.clear_active();
    }

    /// Create a session titled after the question text and make it active.
    ///
    /// The color tag is caller-supplied. Returns the new session id.
    pub async fn create_session(&mut self, question: &str, color: &str) -> Option<String> {
        let title = truncate_title(question, self.title_max_chars);

        match self.api.create_session(&title, color).await {
            Ok(id) => {
                self.registry
                    .insert_front(Session::new(id.clone(), title, color));
                self.registry.activate(&id);
                Some(id)
            }
            Err(err) => {
                self.fail("Could not retrieve new chat session ID", err);
                None
            }
        }
    }

    /// Fetch all sessions of the user and replace the registry.
    pub async fn refresh_sessions(&mut self) {
        let records = match self.api.session_history().await {
            Ok(records) => records,
            Err(err) => {
                self.fail("Could not retrieve chat session IDs", err);
                return;
            }
        };

        let mut sessions = Vec::with_capacity(records.len());
        for record in records {
            let status = match SessionStatus::from_flags(record.hidden, record.pinned) {
                Ok(status) => status,
                Err(err) => {
                    // Invalid backend row; list it as a normal session
                    self.fail("Session cannot be both hidden and pinned", err);
                    SessionStatus::Normal
                }
            };
            sessions.push(Session {
                id: record.session_id,
                title: record.title,
                status,
                color: record.color,
            });
        }
        self.registry.replace_all(sessions);
    }

    /// Flip a session between Normal and Archived, persisting first.
    ///
    /// Archiving a pinned session unpins it.
    pub async fn toggle_archived(&mut self, session_id: &str) {
        let Some(session) = self.registry.get(session_id) else {
            self.notices
                .raise("Could not hide chat session: session not found");
            return;
        };

        let target = if session.status == SessionStatus::Archived {
            SessionStatus::Normal
        } else {
            SessionStatus::Archived
        };

        let (hidden, _) = target.to_flags();
        if let Err(err) = self.api.set_hidden(session_id, hidden).await {
            self.fail("Could not save hiding the chat session", err);
            return;
        }

        if self.registry.set_status(session_id, target).is_err() {
            self.notices
                .raise("Could not hide chat session: session not found");
        }
    }

    /// Flip a session between Normal and Pinned, persisting first.
    ///
    /// Pinning an archived session unarchives it on the backend first, so
    /// the mirror never claims a hidden-and-pinned session.
    pub async fn toggle_pinned(&mut self, session_id: &str) {
        let Some(session) = self.registry.get(session_id) else {
            self.notices
                .raise("Could not pin chat session: session not found");
            return;
        };

        let current = session.status;
        let target = if current == SessionStatus::Pinned {
            SessionStatus::Normal
        } else {
            SessionStatus::Pinned
        };

        if current == SessionStatus::Archived {
            if let Err(err) = self.api.set_hidden(session_id, false).await {
                self.fail("Could not save pinning the chat session", err);
                return;
            }
        }

        let (_, pinned) = target.to_flags();
        if let Err(err) = self.api.set_pinned(session_id, pinned).await {
            self.fail("Could not save pinning the chat session", err);
            return;
        }

        if self.registry.set_status(session_id, target).is_err() {
            self.notices
                .raise("Could not pin chat session: session not found");
        }
    }

    /// Delete a session remotely, then drop it and its messages locally.
    ///
    /// Deleting the active session clears the active selection.
    pub async fn delete_session(&mut self, session_id: &str) {
        if self.registry.get(session_id).is_none() {
            self.notices
                .raise("Could not delete chat session: session not found");
            return;
        }

        if let Err(err) = self.api.delete_session(session_id).await {
            self.fail("Could not save deleting the chat session", err);
            return;
        }

        self.registry.remove(session_id);
        self.store.remove(session_id);
    }

    /// Mark a session as awaiting deletion confirmation.
    pub fn request_deletion(&mut self, session_id: impl Into<String>) {
        self.pending_deletion = Some(session_id.into());
    }

    /// The session awaiting deletion confirmation, if any.
    pub fn pending_deletion(&self) -> Option<&str> {
        self.pending_deletion.as_deref()
    }

    /// Drop the pending deletion without deleting.
    pub fn cancel_deletion(&mut self) {
        self.pending_deletion = None;
    }

    /// Delete the session awaiting confirmation and clear the slot.
    pub async fn confirm_deletion(&mut self) {
        if let Some(session_id) = self.pending_deletion.take() {
            self.delete_session(&session_id).await;
        }
    }

    /// Send a question and append it plus its pending answer to the store.
    ///
    /// The question gets a local placeholder id, rewritten to the
    /// backend-assigned one once the receipt arrives. The answer starts
    /// empty and streaming; its content arrives on the text stream.
    /// Returns the answer id. On failure the question stays in the store
    /// and a notice is raised.
    pub async fn ask(&mut self, session_id: &str, question: &str) -> Option<String> {
        let local_id = Uuid::new_v4().to_string();
        self.store.push(
            session_id,
            Message::question(local_id.clone(), question).with_streaming(true),
        );

        let receipt = match self.api.ask_question(session_id, question).await {
            Ok(receipt) => receipt,
            Err(err) => {
                self.fail("Could not send question", err);
                return None;
            }
        };

        if let Some(message) = self.store.find_message_mut(session_id, &local_id) {
            message.id = receipt.question_id.clone();
        }

        let answer = Message::answer(receipt.answer_id.clone())
            .with_streaming(true)
            .with_source(Source {
                name: receipt.source.clone(),
                link: receipt.source,
                context: receipt.context,
            });
        self.store.push(session_id, answer);

        Some(receipt.answer_id)
    }

    /// Apply the rating toggle to an answer and persist the result.
    ///
    /// The local toggle commits regardless of the backend outcome; a
    /// persistence failure only raises a notice.
    pub async fn rate(&mut self, session_id: &str, message_id: &str, requested: RatingState) {
        let new_state = match self.store.find_message_mut(session_id, message_id) {
            Some(message) if message.kind == MessageKind::Answer => {
                let current = message.rating.unwrap_or(RatingState::Neutral);
                let new_state = current.toggle(requested);
                message.rating = Some(new_state);
                new_state
            }
            _ => {
                self.notices
                    .raise("Could not rate the answer: answer not found");
                return;
            }
        };

        if let Err(err) = self.api.rate_answer(message_id, new_state.score()).await {
            self.fail("Could not save rating the answer", err);
        }
    }

    /// Persist a message the backend has not stored yet.
    ///
    /// Returns the stored message with its backend-assigned id. The store
    /// is not touched; callers decide where the message belongs.
    pub async fn save_message(
        &mut self,
        session_id: &str,
        content: &str,
        kind: MessageKind,
        question_id: Option<&str>,
    ) -> Option<Message> {
        if kind == MessageKind::Answer && question_id.is_none() {
            self.notices
                .raise("Could not save message: answers must reference their question");
            return None;
        }

        match self
            .api
            .save_message(session_id, content, kind == MessageKind::Answer, question_id)
            .await
        {
            Ok(message_id) => {
                let message = match kind {
                    MessageKind::Question => Message::question(message_id, content),
                    MessageKind::Answer => {
                        let mut answer = Message::answer(message_id);
                        answer.content = content.to_string();
                        answer
                    }
                };
                Some(message)
            }
            Err(err) => {
                self.fail("Could not save message", err);
                None
            }
        }
    }

    /// Fetch at most `limit` FAQ entries and replace the mirrored list.
    pub async fn refresh_faq(&mut self, limit: u32) {
        match self.api.faq_entries(limit).await {
            Ok(records) => {
                self.faq = records
                    .into_iter()
                    .map(|r| FaqEntry {
                        id: r.id,
                        question: r.question,
                        answer: r.answer,
                    })
                    .collect();
            }
            Err(err) => self.fail("Could not retrieve FAQ entries", err),
        }
    }

    /// Fold one answer-stream event into the message store.
    ///
    /// Tokens for unknown message ids are ignored: the stream is shared
    /// per user and may carry answers of sessions this mirror never loaded.
    pub fn apply_stream_event(&mut self, event: &AnswerEvent) {
        match event {
            AnswerEvent::Started {
                session_id,
                message_id,
            } => {
                debug!(
                    "answer {} started streaming in session {}",
                    message_id, session_id
                );
            }
            AnswerEvent::Token {
                session_id,
                message_id,
                text,
            } => match self.store.find_message_mut(session_id, message_id) {
                Some(message) => message.content.push_str(text),
                None => trace!("token for unknown message {} ignored", message_id),
            },
            AnswerEvent::Finished {
                session_id,
                message_id,
            } => {
                if let Some(message) = self.store.find_message_mut(session_id, message_id) {
                    message.streaming = false;
                }
            }
        }
    }
}

/// Convert a backend message row into a mirrored message.
fn message_from_record(record: MessageRecord) -> Message {
    let kind = if record.is_answer {
        MessageKind::Answer
    } else {
        MessageKind::Question
    };
    let rating = record
        .is_answer
        .then(|| RatingState::from_score(record.rating));
    let sources = record
        .source
        .map(|s| {
            vec![Source {
                name: s.title,
                link: s.filepath,
                context: s.context,
            }]
        })
        .unwrap_or_default();

    Message {
        id: record.id,
        kind,
        content: record.content,
        streaming: false,
        sources,
        rating,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::SourceRecord;

    fn manager() -> ChatManager {
        ChatManager::new(ApiClient::new("http://localhost:9"))
    }

    #[test]
    fn test_message_from_answer_record() {
        let record = MessageRecord {
            id: "a-1".to_string(),
            is_answer: true,
            content: "An answer".to_string(),
            rating: 1,
            source: Some(SourceRecord {
                title: "Handbook".to_string(),
                filepath: "docs/handbook.pdf".to_string(),
                context: "chunk".to_string(),
            }),
        };

        let message = message_from_record(record);
        assert_eq!(message.kind, MessageKind::Answer);
        assert_eq!(message.rating, Some(RatingState::Positive));
        assert!(!message.streaming);
        assert_eq!(message.sources[0].link, "docs/handbook.pdf");
    }

    #[test]
    fn test_message_from_question_record() {
        let record = MessageRecord {
            id: "q-1".to_string(),
            is_answer: false,
            content: "A question".to_string(),
            rating: 0,
            source: None,
        };

        let message = message_from_record(record);
        assert_eq!(message.kind, MessageKind::Question);
        assert_eq!(message.rating, None);
        assert!(message.sources.is_empty());
    }

    #[test]
    fn test_stream_tokens_accumulate() {
        let mut manager = manager();
        manager
            .store
            .push("s-1", Message::answer("a-1").with_streaming(true));

        for text in ["Hel", "lo"] {
            manager.apply_stream_event(&AnswerEvent::Token {
                session_id: "s-1".to_string(),
                message_id: "a-1".to_string(),
                text: text.to_string(),
            });
        }
        manager.apply_stream_event(&AnswerEvent::Finished {
            session_id: "s-1".to_string(),
            message_id: "a-1".to_string(),
        });

        let message = &manager.messages("s-1").unwrap()[0];
        assert_eq!(message.content, "Hello");
        assert!(!message.streaming);
    }

    #[test]
    fn test_stream_token_for_unknown_message_ignored() {
        let mut manager = manager();
        manager.apply_stream_event(&AnswerEvent::Token {
            session_id: "s-1".to_string(),
            message_id: "nope".to_string(),
            text: "x".to_string(),
        });
        assert!(manager.messages("s-1").is_none());
    }

    #[test]
    fn test_deletion_confirmation_slot() {
        let mut manager = manager();
        assert!(manager.pending_deletion().is_none());

        manager.request_deletion("s-1");
        assert_eq!(manager.pending_deletion(), Some("s-1"));

        manager.cancel_deletion();
        assert!(manager.pending_deletion().is_none());
    }

    #[test]
    fn test_rate_unknown_answer_raises_notice() {
        let mut manager = manager();
        // Synchronous failure path: message lookup fails before any request
        tokio_test::block_on(manager.rate("s-1", "a-1", RatingState::Positive));
        assert!(manager.notice().is_some());
    }
}
