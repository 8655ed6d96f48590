// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User directory.
//!
//! Stores identity, role, password hash and balance. All role-dependent
//! balance rules live here:
//!
//! - a seller's balance is always 0
//! - a buyer's balance is always payable in legal coins
//! - changing role zeroes the balance; becoming a buyer also deletes every
//!   product the user listed while a seller

use redb::{ReadableTable, WriteTransaction};
use serde::{Deserialize, Serialize};

use super::super::database::{get_record, next_id, put_record, USERNAMES, USERS, USER_SEQUENCE};
use super::super::{StorageError, StorageResult, VendingStore};
use super::{products, sessions};
use crate::auth::password::{hash_password, verify_password, PasswordError};
use crate::auth::Role;
use crate::machine::coins::{is_exact_in_coins, MAX_BALANCE};

/// User record as stored in the `users` table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredUser {
    pub user_id: u64,
    pub username: String,
    pub password_hash: String,
    pub role: Role,
    /// Balance in cents
    pub deposit: u64,
}

/// Fields supplied at registration.
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub role: String,
    pub deposit: Option<i64>,
}

/// Partial update; `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub username: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
    pub deposit: Option<i64>,
}

#[derive(Debug, thiserror::Error)]
pub enum UserError {
    /// Business-rule rejection; the message is shown to the caller
    #[error("{0}")]
    Invalid(String),

    #[error("User {0} not found")]
    NotFound(u64),

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<redb::TableError> for UserError {
    fn from(e: redb::TableError) -> Self {
        UserError::Storage(e.into())
    }
}

impl From<redb::StorageError> for UserError {
    fn from(e: redb::StorageError) -> Self {
        UserError::Storage(e.into())
    }
}

impl From<redb::CommitError> for UserError {
    fn from(e: redb::CommitError) -> Self {
        UserError::Storage(e.into())
    }
}

fn invalid(message: impl Into<String>) -> UserError {
    UserError::Invalid(message.into())
}

fn require_text(value: &str, field: &str) -> Result<(), UserError> {
    if value.trim().is_empty() {
        Err(invalid(format!("{field} must not be empty")))
    } else {
        Ok(())
    }
}

fn parse_role(role: &str) -> Result<Role, UserError> {
    role.parse::<Role>().map_err(|e| invalid(e.to_string()))
}

/// Check a requested deposit against the role it would be stored under.
fn validate_deposit(role: Role, deposit: i64) -> Result<u64, UserError> {
    let deposit = u64::try_from(deposit).map_err(|_| invalid("Deposit must not be negative"))?;
    match role {
        Role::Seller if deposit != 0 => Err(invalid("Sellers cannot hold a deposit")),
        Role::Buyer if deposit > MAX_BALANCE => Err(invalid(format!(
            "Deposit must not exceed {MAX_BALANCE}"
        ))),
        Role::Buyer if !is_exact_in_coins(deposit) => Err(invalid(
            "Deposit must be payable in 5, 10, 20, 50 and 100 cent coins",
        )),
        _ => Ok(deposit),
    }
}

/// Repository for the user directory.
pub struct UserRepository<'a> {
    store: &'a VendingStore,
}

impl<'a> UserRepository<'a> {
    /// Create a new UserRepository.
    pub fn new(store: &'a VendingStore) -> Self {
        Self { store }
    }

    /// Get a user by id.
    pub fn find_by_id(&self, user_id: u64) -> StorageResult<Option<StoredUser>> {
        let read_txn = self.store.begin_read()?;
        let table = read_txn.open_table(USERS)?;
        get_record(&table, user_id)
    }

    /// Get a user by exact (case-sensitive) username.
    pub fn find_by_username(&self, username: &str) -> StorageResult<Option<StoredUser>> {
        let read_txn = self.store.begin_read()?;
        let index = read_txn.open_table(USERNAMES)?;
        let Some(user_id) = index.get(username)?.map(|v| v.value()) else {
            return Ok(None);
        };
        let table = read_txn.open_table(USERS)?;
        get_record(&table, user_id)
    }

    /// Look up a user by username and check the password.
    ///
    /// Returns `None` for an unknown user and for a wrong password alike.
    pub fn authenticate(&self, username: &str, password: &str) -> StorageResult<Option<StoredUser>> {
        Ok(self
            .find_by_username(username)?
            .filter(|user| verify_password(password, &user.password_hash)))
    }

    /// Register a new user.
    pub fn create(&self, new_user: NewUser) -> Result<StoredUser, UserError> {
        require_text(&new_user.username, "Username")?;
        require_text(&new_user.password, "Password")?;
        let role = parse_role(&new_user.role)?;
        let deposit = validate_deposit(role, new_user.deposit.unwrap_or(0))?;

        let write_txn = self.store.begin_write()?;
        let user = {
            let mut index = write_txn.open_table(USERNAMES)?;
            if index.get(new_user.username.as_str())?.is_some() {
                return Err(invalid(format!(
                    "Username {} is already taken",
                    new_user.username
                )));
            }

            let user = StoredUser {
                user_id: next_id(&write_txn, USER_SEQUENCE)?,
                username: new_user.username,
                password_hash: hash_password(&new_user.password)?,
                role,
                deposit,
            };

            let mut table = write_txn.open_table(USERS)?;
            put_record(&mut table, user.user_id, &user)?;
            index.insert(user.username.as_str(), user.user_id)?;
            user
        };
        write_txn.commit()?;

        tracing::info!(user_id = user.user_id, role = %user.role, "user registered");
        Ok(user)
    }

    /// Apply a partial update, validating against the merged record.
    ///
    /// The password is re-hashed whenever the patch carries one.
    pub fn update(&self, user_id: u64, patch: UserPatch) -> Result<StoredUser, UserError> {
        let write_txn = self.store.begin_write()?;
        let (user, products_removed) = {
            let mut table = write_txn.open_table(USERS)?;
            let mut user: StoredUser =
                get_record(&table, user_id)?.ok_or(UserError::NotFound(user_id))?;

            let role = match patch.role.as_deref() {
                Some(role) => parse_role(role)?,
                None => user.role,
            };
            let deposit = patch
                .deposit
                .map(|deposit| validate_deposit(role, deposit))
                .transpose()?;

            if let Some(username) = patch.username {
                require_text(&username, "Username")?;
                if username != user.username {
                    let mut index = write_txn.open_table(USERNAMES)?;
                    if index.get(username.as_str())?.is_some() {
                        return Err(invalid(format!("Username {username} is already taken")));
                    }
                    index.remove(user.username.as_str())?;
                    index.insert(username.as_str(), user_id)?;
                    user.username = username;
                }
            }

            if let Some(password) = patch.password {
                require_text(&password, "Password")?;
                user.password_hash = hash_password(&password)?;
            }

            let mut products_removed = 0;
            if role != user.role {
                user.deposit = 0;
                if role == Role::Buyer {
                    products_removed = products::delete_by_seller_in(&write_txn, user_id)?;
                }
                user.role = role;
            } else if let Some(deposit) = deposit {
                user.deposit = deposit;
            }

            put_record(&mut table, user_id, &user)?;
            (user, products_removed)
        };
        write_txn.commit()?;

        tracing::info!(
            user_id,
            role = %user.role,
            products_removed,
            "user updated"
        );
        Ok(user)
    }

    /// Delete a user together with their sessions and products.
    pub fn delete(&self, user_id: u64) -> Result<StoredUser, UserError> {
        let write_txn = self.store.begin_write()?;
        let user = {
            let mut table = write_txn.open_table(USERS)?;
            let user: StoredUser = get_record(&table, user_id)?.ok_or(UserError::NotFound(user_id))?;
            table.remove(user_id)?;

            let mut index = write_txn.open_table(USERNAMES)?;
            index.remove(user.username.as_str())?;

            products::delete_by_seller_in(&write_txn, user_id)?;
            sessions::delete_all_in(&write_txn, user_id)?;
            user
        };
        write_txn.commit()?;

        tracing::info!(user_id, "user deleted");
        Ok(user)
    }
}

/// Load a user inside an open write transaction.
pub(crate) fn get_in(txn: &WriteTransaction, user_id: u64) -> StorageResult<Option<StoredUser>> {
    let table = txn.open_table(USERS)?;
    get_record(&table, user_id)
}
