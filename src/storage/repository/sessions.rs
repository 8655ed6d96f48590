// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Session registry.
//!
//! A session binds an issued credential to its owner. A credential is only
//! trusted while a session carrying the exact same token exists. The
//! registry does not cap sessions per user; login counts them first and
//! decides what to do.

use chrono::{DateTime, Utc};
use redb::{ReadableTable, WriteTransaction};
use serde::{Deserialize, Serialize};

use super::super::database::{next_id, SESSIONS, SESSION_SEQUENCE};
use super::super::{StorageResult, VendingStore};

/// Session stored in the `sessions` table, keyed by token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredSession {
    pub session_id: u64,
    pub owner_user_id: u64,
    pub token: String,
    pub issued_at: DateTime<Utc>,
}

/// Repository for live sessions.
pub struct SessionRepository<'a> {
    store: &'a VendingStore,
}

impl<'a> SessionRepository<'a> {
    /// Create a new SessionRepository.
    pub fn new(store: &'a VendingStore) -> Self {
        Self { store }
    }

    /// Record a new session. Does not check for existing sessions.
    pub fn create(
        &self,
        token: &str,
        owner_user_id: u64,
        issued_at: DateTime<Utc>,
    ) -> StorageResult<StoredSession> {
        let write_txn = self.store.begin_write()?;
        let session = {
            let session = StoredSession {
                session_id: next_id(&write_txn, SESSION_SEQUENCE)?,
                owner_user_id,
                token: token.to_string(),
                issued_at,
            };
            let json = serde_json::to_vec(&session)?;
            let mut table = write_txn.open_table(SESSIONS)?;
            table.insert(token, json.as_slice())?;
            session
        };
        write_txn.commit()?;

        tracing::debug!(
            session_id = session.session_id,
            user_id = owner_user_id,
            "session created"
        );
        Ok(session)
    }

    /// Number of live sessions owned by a user.
    pub fn count(&self, owner_user_id: u64) -> StorageResult<usize> {
        Ok(self.list_by_owner(owner_user_id)?.len())
    }

    /// Live sessions owned by a user.
    pub fn list_by_owner(&self, owner_user_id: u64) -> StorageResult<Vec<StoredSession>> {
        let read_txn = self.store.begin_read()?;
        let table = read_txn.open_table(SESSIONS)?;
        sessions_of(&table, owner_user_id)
    }

    /// Find the session carrying a token.
    pub fn find_by_token(&self, token: &str) -> StorageResult<Option<StoredSession>> {
        let read_txn = self.store.begin_read()?;
        let table = read_txn.open_table(SESSIONS)?;
        match table.get(token)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Revoke one session. Returns whether it existed.
    pub fn delete(&self, token: &str) -> StorageResult<bool> {
        let write_txn = self.store.begin_write()?;
        let existed = {
            let mut table = write_txn.open_table(SESSIONS)?;
            let removed = table.remove(token)?;
            removed.is_some()
        };
        write_txn.commit()?;
        Ok(existed)
    }

    /// Revoke every session of a user, returning how many were removed.
    pub fn delete_all(&self, owner_user_id: u64) -> StorageResult<usize> {
        let write_txn = self.store.begin_write()?;
        let removed = delete_all_in(&write_txn, owner_user_id)?;
        write_txn.commit()?;
        Ok(removed)
    }
}

fn sessions_of(
    table: &impl ReadableTable<&'static str, &'static [u8]>,
    owner_user_id: u64,
) -> StorageResult<Vec<StoredSession>> {
    let mut sessions = Vec::new();
    for entry in table.iter()? {
        let (_, value) = entry?;
        let session: StoredSession = serde_json::from_slice(value.value())?;
        if session.owner_user_id == owner_user_id {
            sessions.push(session);
        }
    }
    Ok(sessions)
}

/// Remove a user's sessions inside an open write transaction.
pub(crate) fn delete_all_in(txn: &WriteTransaction, owner_user_id: u64) -> StorageResult<usize> {
    let mut table = txn.open_table(SESSIONS)?;
    let owned = sessions_of(&table, owner_user_id)?;
    for session in &owned {
        table.remove(session.token.as_str())?;
    }
    Ok(owned.len())
}
