// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Deposit, reset and buy.
//!
//! Each operation reads, validates and writes inside a single redb write
//! transaction. Write transactions are exclusive, so two buyers racing for
//! the last unit of a product cannot both succeed.

use redb::WriteTransaction;
use serde::Serialize;
use utoipa::ToSchema;

use super::coins::{decompose, is_legal_denomination, CoinError, MAX_BALANCE};
use crate::auth::Role;
use crate::storage::database::{get_record, put_record, PRODUCTS, USERS};
use crate::storage::{StorageError, StoredProduct, StoredUser, VendingStore};

#[derive(Debug, thiserror::Error)]
pub enum VendingError {
    #[error("Amount must be a positive number")]
    NegativeAmount,

    #[error("{0} is not an accepted coin (use 5, 10, 20, 50 or 100)")]
    IllegalCoin(u64),

    #[error("Balance cannot exceed {MAX_BALANCE}")]
    BalanceLimit,

    #[error("Quantity must be at least 1")]
    InvalidQuantity,

    #[error("User {0} not found")]
    UserNotFound(u64),

    #[error("Only buyers can use the machine")]
    NotABuyer,

    #[error("Product {0} not found")]
    ProductNotFound(u64),

    #[error("Not enough products: requested {requested}, available {available}")]
    NotEnoughProducts { requested: u64, available: u64 },

    #[error("Not enough money: price {price}, balance {balance}")]
    NotEnoughMoney { price: u64, balance: u64 },

    #[error("Exact change cannot be returned for this purchase")]
    ChangeUnavailable(#[source] CoinError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<redb::TableError> for VendingError {
    fn from(e: redb::TableError) -> Self {
        VendingError::Storage(e.into())
    }
}

impl From<redb::CommitError> for VendingError {
    fn from(e: redb::CommitError) -> Self {
        VendingError::Storage(e.into())
    }
}

/// Result of a successful purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Purchase {
    /// Units bought
    pub amount: u64,
    /// Product name
    pub product: String,
    /// Coins returned, smallest first
    pub change: Vec<u64>,
}

/// The vending machine's transaction engine.
pub struct VendingMachine<'a> {
    store: &'a VendingStore,
}

impl<'a> VendingMachine<'a> {
    pub fn new(store: &'a VendingStore) -> Self {
        Self { store }
    }

    /// Insert a single coin into a buyer's balance. Returns the new balance.
    pub fn deposit(&self, user_id: u64, amount: i64) -> Result<u64, VendingError> {
        let coin = u64::try_from(amount).map_err(|_| VendingError::NegativeAmount)?;
        if !is_legal_denomination(coin) {
            return Err(VendingError::IllegalCoin(coin));
        }

        let write_txn = self.store.begin_write()?;
        let balance = {
            let mut user = load_buyer(&write_txn, user_id)?;
            user.deposit = user
                .deposit
                .checked_add(coin)
                .filter(|balance| *balance <= MAX_BALANCE)
                .ok_or(VendingError::BalanceLimit)?;
            let mut users = write_txn.open_table(USERS)?;
            put_record(&mut users, user_id, &user)?;
            user.deposit
        };
        write_txn.commit()?;

        tracing::info!(user_id, coin, balance, "coin deposited");
        Ok(balance)
    }

    /// Set a user's balance to 0.
    pub fn reset(&self, user_id: u64) -> Result<(), VendingError> {
        let write_txn = self.store.begin_write()?;
        {
            let mut user = load_user(&write_txn, user_id)?;
            user.deposit = 0;
            let mut users = write_txn.open_table(USERS)?;
            put_record(&mut users, user_id, &user)?;
        }
        write_txn.commit()?;

        tracing::info!(user_id, "deposit reset");
        Ok(())
    }

    /// Buy `amount` units of a product.
    ///
    /// The whole balance is consumed: what is left after paying is returned
    /// as change and the stored balance becomes 0.
    pub fn buy(&self, user_id: u64, product_id: u64, amount: i64) -> Result<Purchase, VendingError> {
        let amount = u64::try_from(amount)
            .ok()
            .filter(|a| *a > 0)
            .ok_or(VendingError::InvalidQuantity)?;

        let write_txn = self.store.begin_write()?;
        let purchase = {
            let mut user = load_buyer(&write_txn, user_id)?;

            let mut products = write_txn.open_table(PRODUCTS)?;
            let mut product: StoredProduct =
                get_record(&products, product_id)?.ok_or(VendingError::ProductNotFound(product_id))?;

            if amount > product.amount_available {
                return Err(VendingError::NotEnoughProducts {
                    requested: amount,
                    available: product.amount_available,
                });
            }

            let price = product.cost.checked_mul(amount);
            let change_total = match price {
                Some(price) if price <= user.deposit => user.deposit - price,
                _ => {
                    return Err(VendingError::NotEnoughMoney {
                        price: price.unwrap_or(u64::MAX),
                        balance: user.deposit,
                    })
                }
            };
            let change = decompose(change_total).map_err(VendingError::ChangeUnavailable)?;

            product.amount_available -= amount;
            put_record(&mut products, product_id, &product)?;

            user.deposit = 0;
            let mut users = write_txn.open_table(USERS)?;
            put_record(&mut users, user_id, &user)?;

            Purchase {
                amount,
                product: product.product_name,
                change,
            }
        };
        write_txn.commit()?;

        tracing::info!(
            user_id,
            product_id,
            amount = purchase.amount,
            coins_returned = purchase.change.len(),
            "purchase completed"
        );
        Ok(purchase)
    }
}

fn load_user(txn: &WriteTransaction, user_id: u64) -> Result<StoredUser, VendingError> {
    crate::storage::repository::users::get_in(txn, user_id)?
        .ok_or(VendingError::UserNotFound(user_id))
}

/// The credential's role may be stale, so the stored role is checked too.
fn load_buyer(txn: &WriteTransaction, user_id: u64) -> Result<StoredUser, VendingError> {
    let user = load_user(txn, user_id)?;
    if user.role != Role::Buyer {
        return Err(VendingError::NotABuyer);
    }
    Ok(user)
}
