//! Session and message state for the chat client

pub mod registry;
pub mod store;

pub use registry::{MessageStore, SessionRegistry};
pub use store::{FaqEntry, Message, MessageKind, RatingState, Session, SessionStatus, Source};
