//! Shared types for the menu catalog
//!
//! Common types used by the server and its clients: error codes and
//! response envelopes, catalog models, ordering primitives and message
//! bus payloads.

pub mod error;
pub mod message;
pub mod models;
pub mod util;

pub use message::{BusMessage, EventType};
