//! REST client for the ProQA backend

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::debug;

/// Error type for backend calls
#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("backend returned HTTP {status}: {body}")]
    Api { status: u16, body: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

/// One session row of a history fetch
#[derive(Debug, Clone, Deserialize)]
pub struct SessionRecord {
    pub session_id: String,
    pub title: String,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub pinned: bool,
    #[serde(default)]
    pub color: String,
}

#[derive(Debug, Deserialize)]
struct SessionHistory {
    chats: Vec<SessionRecord>,
}

/// One message row of a message-history fetch
#[derive(Debug, Clone, Deserialize)]
pub struct MessageRecord {
    pub id: String,
    #[serde(default)]
    pub is_answer: bool,
    pub content: String,
    #[serde(default)]
    pub rating: i64,
    #[serde(default)]
    pub source: Option<SourceRecord>,
}

/// Source attached to an answer row
#[derive(Debug, Clone, Deserialize)]
pub struct SourceRecord {
    pub title: String,
    pub filepath: String,
    #[serde(default)]
    pub context: String,
}

#[derive(Debug, Deserialize)]
struct MessageHistory {
    messages: Vec<MessageRecord>,
}

#[derive(Debug, Deserialize)]
struct CreatedSession {
    id: String,
}

/// Receipt for a posted question: ids of the stored question and the
/// pending answer, plus the context the backend retrieved for it.
#[derive(Debug, Clone, Deserialize)]
pub struct QuestionReceipt {
    #[serde(default)]
    pub context: String,
    #[serde(default)]
    pub source: String,
    pub question_id: String,
    pub answer_id: String,
}

#[derive(Debug, Deserialize)]
struct SavedMessage {
    message_id: String,
}

/// One FAQ row
#[derive(Debug, Clone, Deserialize)]
pub struct FaqRecord {
    pub id: String,
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Deserialize)]
struct FaqEntries {
    faq_entries: Vec<FaqRecord>,
}

// Mutation endpoints reply with a status word ("hidden", "pinned", ...)
// which callers do not branch on; decoding it checks the response shape.
#[derive(Debug, Deserialize)]
struct StatusReply {
    #[serde(default)]
    #[allow(dead_code)]
    status: String,
}

/// HTTP client for the ProQA backend.
///
/// The backend authenticates via session cookies, so the inner client
/// carries a cookie store. Cloning is cheap and shares the store.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a client for the given base URL (no trailing slash).
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_timeout(base_url, Duration::from_secs(30))
    }

    /// Create a client with a custom request timeout.
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: Client::builder()
                .cookie_store(true)
                .timeout(timeout)
                .build()
                .unwrap_or_else(|_| Client::new()),
            base_url: base_url.into(),
        }
    }

    /// Base URL this client talks to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The underlying HTTP client, for callers that share the cookie session.
    pub(crate) fn http(&self) -> &Client {
        &self.client
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!("POST {}", url);
        let response = self.client.post(&url).json(body).send().await?;
        Self::decode(response).await
    }

    pub(crate) async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> ApiResult<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ApiError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json().await?)
    }

    /// Create a chat session, returning its backend-assigned id.
    pub async fn create_session(&self, title: &str, color: &str) -> ApiResult<String> {
        let created: CreatedSession = self
            .post_json(
                "/api/chat/creation/",
                &json!({ "title": title, "color": color }),
            )
            .await?;
        Ok(created.id)
    }

    /// Fetch all sessions of the logged-in user.
    pub async fn session_history(&self) -> ApiResult<Vec<SessionRecord>> {
        let history: SessionHistory = self.post_json("/api/chat/history/", &json!({})).await?;
        Ok(history.chats)
    }

    /// Fetch the messages of one session, in conversation order.
    pub async fn session_messages(&self, session_id: &str) -> ApiResult<Vec<MessageRecord>> {
        let history: MessageHistory = self
            .post_json("/api/chat/messages/", &json!({ "session": session_id }))
            .await?;
        Ok(history.messages)
    }

    /// Persist a session's hidden flag.
    pub async fn set_hidden(&self, session_id: &str, hide: bool) -> ApiResult<()> {
        let _: StatusReply = self
            .post_json(
                "/api/chat/hiding/",
                &json!({ "hide": hide, "chat_session_id": session_id }),
            )
            .await?;
        Ok(())
    }

    /// Persist a session's pinned flag.
    pub async fn set_pinned(&self, session_id: &str, pin: bool) -> ApiResult<()> {
        let _: StatusReply = self
            .post_json(
                "/api/chat/pinning/",
                &json!({ "pin": pin, "chat_session_id": session_id }),
            )
            .await?;
        Ok(())
    }

    /// Delete a session on the backend.
    pub async fn delete_session(&self, session_id: &str) -> ApiResult<()> {
        let _: StatusReply = self
            .post_json(
                "/api/chat/deletion/",
                &json!({ "chat_session_id": session_id }),
            )
            .await?;
        Ok(())
    }

    /// Persist an answer's rating score (-1, 0 or 1).
    pub async fn rate_answer(&self, answer_id: &str, score: i64) -> ApiResult<()> {
        let _: StatusReply = self
            .post_json(
                "/api/answer/rating/",
                &json!({ "answer_id": answer_id, "rating": score }),
            )
            .await?;
        Ok(())
    }

    /// Post a question; the answer content arrives on the text stream.
    pub async fn ask_question(&self, session_id: &str, question: &str) -> ApiResult<QuestionReceipt> {
        self.post_json(
            "/api/question/",
            &json!({ "question": question, "session": session_id }),
        )
        .await
    }

    /// Persist a message, returning its backend-assigned id.
    ///
    /// Answers must reference the question they belong to.
    pub async fn save_message(
        &self,
        session_id: &str,
        content: &str,
        is_answer: bool,
        question_id: Option<&str>,
    ) -> ApiResult<String> {
        let saved: SavedMessage = self
            .post_json(
                "/api/chat/saving/",
                &json!({
                    "session": session_id,
                    "content": content,
                    "is_answer": is_answer,
                    "question_id": question_id,
                }),
            )
            .await?;
        Ok(saved.message_id)
    }

    /// Fetch at most `limit` FAQ entries.
    pub async fn faq_entries(&self, limit: u32) -> ApiResult<Vec<FaqRecord>> {
        let entries: FaqEntries = self
            .post_json("/api/faq/entries/", &json!({ "number": limit }))
            .await?;
        Ok(entries.faq_entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_record_with_source() {
        let raw = r#"{
            "id": "m-1",
            "is_answer": true,
            "content": "An answer",
            "rating": -1,
            "source": {"title": "Handbook", "filepath": "docs/handbook.pdf", "context": "..."}
        }"#;
        let record: MessageRecord = serde_json::from_str(raw).unwrap();
        assert!(record.is_answer);
        assert_eq!(record.rating, -1);
        assert_eq!(record.source.unwrap().title, "Handbook");
    }

    #[test]
    fn test_message_record_without_source() {
        let raw = r#"{"id": "m-2", "content": "A question"}"#;
        let record: MessageRecord = serde_json::from_str(raw).unwrap();
        assert!(!record.is_answer);
        assert_eq!(record.rating, 0);
        assert!(record.source.is_none());
    }

    #[test]
    fn test_session_record_defaults() {
        let raw = r#"{"session_id": "s-1", "title": "Hello"}"#;
        let record: SessionRecord = serde_json::from_str(raw).unwrap();
        assert!(!record.hidden);
        assert!(!record.pinned);
        assert_eq!(record.color, "");
    }

    #[test]
    fn test_question_receipt_shape() {
        let raw = r#"{
            "context": "chunk text",
            "source": "faq.md",
            "question_id": "q-9",
            "answer_id": "a-9"
        }"#;
        let receipt: QuestionReceipt = serde_json::from_str(raw).unwrap();
        assert_eq!(receipt.question_id, "q-9");
        assert_eq!(receipt.answer_id, "a-9");
    }
}
