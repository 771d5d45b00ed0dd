//! Common types shared across Relay crates.
//!
//! This crate provides the error taxonomy and the chat message model that the
//! registry, dispatcher, memory layer and orchestrator all speak.

pub mod error;
pub mod message;

pub use error::{RelayError, Result};
pub use message::{ContentPart, ImageUrl, Message, MessageContent, MessageRole};
