// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Repository layer providing typed access to the vending database.
//!
//! Each repository provides CRUD operations for a specific entity type.
//! Operations that must change several tables atomically are exposed as
//! `*_in` functions taking an open write transaction.

pub mod products;
pub mod sessions;
pub mod users;

pub use products::{CatalogError, NewProduct, ProductPatch, ProductRepository, StoredProduct};
pub use sessions::{SessionRepository, StoredSession};
pub use users::{NewUser, StoredUser, UserError, UserPatch, UserRepository};
