//! Core types for Folio.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod collection;
pub mod email;
pub mod id;
pub mod media;

pub use collection::{Bucket, Collection};
pub use email::{Email, EmailError};
pub use id::*;
pub use media::{MediaKind, MediaKindError};
