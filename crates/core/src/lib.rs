//! Folio Core - Shared content types.
//!
//! This crate provides the types shared by every Folio component:
//! - `sync` - Content store client, realtime subscriptions and view bindings
//! - `cli` - Command-line tools for migrations and content management
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no
//! database access, no network clients. Everything here can be used from a
//! test or a binary without a runtime.
//!
//! # Modules
//!
//! - [`types`] - Typed IDs, emails, media kinds, collection and bucket names
//! - [`models`] - The persisted content entities and their write payloads

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod models;
pub mod types;

pub use models::*;
pub use types::*;
