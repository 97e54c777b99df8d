//! Cloak Core Types and Traits
//!
//! This crate provides the fundamental types and traits used throughout Cloak:
//! - Conversation message types (closed set of message kinds)
//! - Capability traits for text generation and document loading
//! - Core error types

pub mod error;
pub mod normalized;
pub mod provider;

pub use error::{Error, Result};
