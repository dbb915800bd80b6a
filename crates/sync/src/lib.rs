//! Folio Sync - Content synchronization core.
//!
//! Keeps the public site and the admin dashboard consistent with the
//! content store:
//!
//! 1. [`store`] - capability interface to the structured-data service
//!    (query, count, insert, update, upsert, delete) plus its change feed,
//!    with `PostgreSQL` and in-process adapters.
//! 2. [`blob`] - capability interface to bucket storage (upload, public URL,
//!    remove), with filesystem and in-process adapters.
//! 3. [`realtime`] - the subscription manager: one upstream change
//!    subscription per watched collection, fanned out to every bound view.
//! 4. [`bindings`] - per-screen controllers holding the last fetched
//!    snapshot, pure client-side filters, and mutation actions.
//! 5. [`session`] - the session guard gating admin views.
//!
//! Every mutation is a remote call followed by a full re-fetch. Nothing is
//! merged into a snapshot optimistically.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod auth;
pub mod bindings;
pub mod blob;
pub mod client;
pub mod config;
pub mod db;
pub mod error;
pub mod live;
pub mod notify;
pub mod realtime;
pub mod session;
pub mod store;

pub use client::{Backend, SiteClient};
pub use error::StoreError;
