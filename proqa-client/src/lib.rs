//! HTTP client and state mirroring for the ProQA backend
//!
//! [`ApiClient`] speaks the backend's REST endpoints, [`ChatManager`]
//! mirrors the remote session/message state in memory, and [`stream`]
//! consumes the shared answer stream.

pub mod api;
pub mod auth;
pub mod chat;
pub mod notice;
pub mod stream;

pub use api::{ApiClient, ApiError, ApiResult};
pub use auth::{AuthClient, LoginStatus};
pub use chat::ChatManager;
pub use notice::NoticeBoard;
pub use stream::AnswerEvent;
