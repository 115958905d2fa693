//! SQLite index of which sites hold which titles.
//!
//! The index is shared by every participating site and stores three
//! relations, all keyed by [`StringHasher`](crosswiki_title::StringHasher)
//! hashes to keep rows small:
//! - **Sites**: one row per participating site, with its interwiki prefix.
//! - **Titles**: every distinct raw title ever seen on any site, plus the hash
//!   of its normalized form for equivalence lookups.
//! - **Pages**: which site currently has which title in which namespace.
//!
//! Writes that touch more than one table are *not* wrapped in a transaction.
//! The index may live in a different database than the edit that triggered
//! it, so no single transaction could cover both anyway. Instead, writes are
//! ordered so that any partial failure only leaves harmless rows behind.

mod db;
pub mod error;
mod models;
mod store;

pub use crate::db::Database;
pub use crate::models::{LinkDetails, PageEntry, SitePage, TitleEntry};
pub use crate::store::{BulkInsert, IndexStore, Insert};
