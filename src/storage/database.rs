// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Embedded vending database backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `users`: user_id → serialized StoredUser
//! - `usernames`: username → user_id (uniqueness index)
//! - `products`: product_id → serialized StoredProduct
//! - `product_names`: product name → product_id (uniqueness index)
//! - `sessions`: token → serialized StoredSession
//! - `sequences`: sequence name → last issued id
//!
//! redb allows a single write transaction at a time, so every
//! read-validate-write sequence run inside one write transaction is
//! serialized against all others.

use std::path::Path;

use redb::{
    Database, ReadTransaction, ReadableDatabase, ReadableTable, Table, TableDefinition,
    WriteTransaction,
};
use serde::{de::DeserializeOwned, Serialize};

// =============================================================================
// Table Definitions
// =============================================================================

pub(crate) const USERS: TableDefinition<u64, &[u8]> = TableDefinition::new("users");

pub(crate) const USERNAMES: TableDefinition<&str, u64> = TableDefinition::new("usernames");

pub(crate) const PRODUCTS: TableDefinition<u64, &[u8]> = TableDefinition::new("products");

pub(crate) const PRODUCT_NAMES: TableDefinition<&str, u64> =
    TableDefinition::new("product_names");

pub(crate) const SESSIONS: TableDefinition<&str, &[u8]> = TableDefinition::new("sessions");

const SEQUENCES: TableDefinition<&str, u64> = TableDefinition::new("sequences");

pub(crate) const USER_SEQUENCE: &str = "users";
pub(crate) const PRODUCT_SEQUENCE: &str = "products";
pub(crate) const SESSION_SEQUENCE: &str = "sessions";

/// File name of the database inside the data directory.
pub const DATABASE_FILE: &str = "vending.redb";

// =============================================================================
// Error Type
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("redb error: {0}")]
    Redb(#[from] redb::Error),

    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("permission denied: user {user_id} cannot modify {resource}")]
    PermissionDenied { user_id: u64, resource: String },
}

pub type StorageResult<T> = Result<T, StorageError>;

// =============================================================================
// Record helpers
// =============================================================================

/// Load and deserialize the record stored under `id`.
pub(crate) fn get_record<T, R>(table: &R, id: u64) -> StorageResult<Option<T>>
where
    T: DeserializeOwned,
    R: ReadableTable<u64, &'static [u8]>,
{
    match table.get(id)? {
        Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
        None => Ok(None),
    }
}

/// Serialize `record` and store it under `id`, replacing any previous value.
pub(crate) fn put_record<T: Serialize>(
    table: &mut Table<'_, u64, &'static [u8]>,
    id: u64,
    record: &T,
) -> StorageResult<()> {
    let json = serde_json::to_vec(record)?;
    table.insert(id, json.as_slice())?;
    Ok(())
}

/// Deserialize every record of an id-keyed table, in id order.
pub(crate) fn all_records<T, R>(table: &R) -> StorageResult<Vec<T>>
where
    T: DeserializeOwned,
    R: ReadableTable<u64, &'static [u8]>,
{
    let mut records = Vec::new();
    for entry in table.iter()? {
        let (_, value) = entry?;
        records.push(serde_json::from_slice(value.value())?);
    }
    Ok(records)
}

/// Issue the next id of a sequence (ids start at 1).
pub(crate) fn next_id(txn: &WriteTransaction, sequence: &str) -> StorageResult<u64> {
    let mut table = txn.open_table(SEQUENCES)?;
    let next = table.get(sequence)?.map(|v| v.value()).unwrap_or(0) + 1;
    table.insert(sequence, next)?;
    Ok(next)
}

// =============================================================================
// VendingStore
// =============================================================================

/// Embedded ACID database holding users, products and sessions.
pub struct VendingStore {
    db: Database,
}

impl VendingStore {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = Database::create(path)?;

        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(USERS)?;
            let _ = write_txn.open_table(USERNAMES)?;
            let _ = write_txn.open_table(PRODUCTS)?;
            let _ = write_txn.open_table(PRODUCT_NAMES)?;
            let _ = write_txn.open_table(SESSIONS)?;
            let _ = write_txn.open_table(SEQUENCES)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }

    /// Open the database file inside a data directory.
    pub fn open_in_dir(data_dir: &Path) -> StorageResult<Self> {
        Self::open(&data_dir.join(DATABASE_FILE))
    }

    pub(crate) fn begin_read(&self) -> StorageResult<ReadTransaction> {
        Ok(self.db.begin_read()?)
    }

    pub(crate) fn begin_write(&self) -> StorageResult<WriteTransaction> {
        Ok(self.db.begin_write()?)
    }

    /// Verify the database answers a read transaction.
    pub fn health_check(&self) -> StorageResult<()> {
        let read_txn = self.begin_read()?;
        let _ = read_txn.open_table(SESSIONS)?;
        Ok(())
    }
}
