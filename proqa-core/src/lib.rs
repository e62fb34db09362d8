//! Core types and state for the ProQA chat client
//!
//! This crate provides the session registry, message store, configuration,
//! and logging shared by the client crates.

pub mod config;
pub mod error;
pub mod logging;
pub mod session;
pub mod utils;

pub use error::{Error, Result};
