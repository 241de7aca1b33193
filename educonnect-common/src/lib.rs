//! # EduConnect Common Library
//!
//! Shared code for the EduConnect lesson client including:
//! - Error types
//! - Client configuration loading
//! - Storage port (tab-scoped and persistent key/value stores)
//! - Auth port (bearer credential source)
//! - Presence and view event types, view event bus
//! - Time utilities

pub mod auth;
pub mod config;
pub mod error;
pub mod events;
pub mod storage;
pub mod time;

pub use error::{Error, Result};
