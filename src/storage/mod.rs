// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Storage Module
//!
//! Persistent state lives in a single embedded redb database file under
//! `DATA_DIR`. Three record sets are kept:
//!
//! ```text
//! users      user_id    -> StoredUser     (+ username index)
//! products   product_id -> StoredProduct  (+ product name index)
//! sessions   token      -> StoredSession
//! ```
//!
//! Records are serialized as JSON. Every mutation that touches more than
//! one record runs in one write transaction.

pub mod database;
pub mod ownership;
pub mod repository;

pub use database::{StorageError, StorageResult, VendingStore};
pub use ownership::{OwnedResource, OwnershipCheck, OwnershipEnforcer};
pub use repository::{
    CatalogError, NewProduct, NewUser, ProductPatch, ProductRepository, SessionRepository,
    StoredProduct, StoredSession, StoredUser, UserError, UserPatch, UserRepository,
};
