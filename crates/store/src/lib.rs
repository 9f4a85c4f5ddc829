//! Staffdesk record store.
//!
//! This crate provides the flat-file persistence layer for the Staffdesk
//! backend: a generic [`JsonStore`] that keeps a whole collection in one
//! pretty-printed JSON file, with store-assigned integer identities for
//! record types that carry one.

pub mod error;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use store::{JsonStore, Record};
