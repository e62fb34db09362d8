//! Server-sent answer stream
//!
//! Answer content is not returned by `/api/question/`; it arrives token by
//! token on the user's shared `/text-stream/` channel. Each `message`
//! event carries a percent-encoded token plus the session and message ids
//! it belongs to, bracketed by `[START]` and `[END]` sentinels.

use crate::api::{ApiClient, ApiError, ApiResult};
use eventsource_stream::Eventsource;
use futures::{Stream, StreamExt};
use serde::Deserialize;
use std::pin::Pin;

const START_SENTINEL: &str = "[START]";
const END_SENTINEL: &str = "[END]";

/// One decoded event from the answer stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerEvent {
    /// An answer started streaming
    Started {
        session_id: String,
        message_id: String,
    },
    /// A piece of answer text
    Token {
        session_id: String,
        message_id: String,
        text: String,
    },
    /// The answer finished streaming
    Finished {
        session_id: String,
        message_id: String,
    },
}

impl AnswerEvent {
    /// Session id this event belongs to.
    pub fn session_id(&self) -> &str {
        match self {
            AnswerEvent::Started { session_id, .. }
            | AnswerEvent::Token { session_id, .. }
            | AnswerEvent::Finished { session_id, .. } => session_id,
        }
    }

    /// Message id this event belongs to.
    pub fn message_id(&self) -> &str {
        match self {
            AnswerEvent::Started { message_id, .. }
            | AnswerEvent::Token { message_id, .. }
            | AnswerEvent::Finished { message_id, .. } => message_id,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenPayload {
    token: String,
    #[serde(rename = "messageID")]
    message_id: String,
    #[serde(rename = "sessionID")]
    session_id: String,
}

/// Boxed stream of decoded answer events
pub type AnswerEventStream = Pin<Box<dyn Stream<Item = ApiResult<AnswerEvent>> + Send>>;

/// Decode one SSE `data` payload into an answer event.
pub fn decode_event(data: &str) -> ApiResult<AnswerEvent> {
    let payload: TokenPayload = serde_json::from_str(data)?;
    let token = urlencoding::decode(&payload.token)
        .map_err(|e| ApiError::InvalidResponse(format!("bad token encoding: {}", e)))?
        .into_owned();

    let event = match token.as_str() {
        START_SENTINEL => AnswerEvent::Started {
            session_id: payload.session_id,
            message_id: payload.message_id,
        },
        END_SENTINEL => AnswerEvent::Finished {
            session_id: payload.session_id,
            message_id: payload.message_id,
        },
        _ => AnswerEvent::Token {
            session_id: payload.session_id,
            message_id: payload.message_id,
            text: token,
        },
    };
    Ok(event)
}

/// Open the user's answer stream.
///
/// Events with names other than `message` are skipped. The stream ends
/// when the server closes the connection.
pub async fn open(api: &ApiClient) -> ApiResult<AnswerEventStream> {
    let url = format!("{}/text-stream/", api.base_url());
    let response = api.http().get(&url).send().await?;

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

    let events = response
        .bytes_stream()
        .eventsource()
        .filter_map(|event| async move {
            match event {
                Ok(event) if event.event == "message" => Some(decode_event(&event.data)),
                Ok(_) => None,
                Err(e) => Some(Err(ApiError::InvalidResponse(e.to_string()))),
            }
        });

    Ok(Box::pin(events))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(token: &str) -> String {
        format!(
            r#"{{"token":"{}","messageID":"a-1","sessionID":"s-1"}}"#,
            token
        )
    }

    #[test]
    fn test_decode_start_sentinel() {
        let event = decode_event(&payload("%5BSTART%5D")).unwrap();
        assert_eq!(
            event,
            AnswerEvent::Started {
                session_id: "s-1".to_string(),
                message_id: "a-1".to_string(),
            }
        );
    }

    #[test]
    fn test_decode_end_sentinel() {
        let event = decode_event(&payload("%5BEND%5D")).unwrap();
        assert!(matches!(event, AnswerEvent::Finished { .. }));
    }

    #[test]
    fn test_decode_token_is_percent_decoded() {
        let event = decode_event(&payload("Hello%20world")).unwrap();
        match event {
            AnswerEvent::Token { text, .. } => assert_eq!(text, "Hello world"),
            other => panic!("expected token, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode_event("not json").is_err());
    }

    #[test]
    fn test_event_accessors() {
        let event = decode_event(&payload("hi")).unwrap();
        assert_eq!(event.session_id(), "s-1");
        assert_eq!(event.message_id(), "a-1");
    }
}
