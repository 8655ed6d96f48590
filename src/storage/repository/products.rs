// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Product catalog.
//!
//! Products are owned by the seller that listed them. Names are globally
//! unique; cost and stock never go negative.

use redb::{ReadableTable, WriteTransaction};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::super::database::{
    all_records, get_record, next_id, put_record, PRODUCTS, PRODUCT_NAMES, PRODUCT_SEQUENCE,
    USERS,
};
use super::super::{OwnedResource, StorageError, StorageResult, VendingStore};
use super::users::StoredUser;
use crate::auth::Role;

/// Product stored in the `products` table.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StoredProduct {
    pub product_id: u64,
    pub product_name: String,
    /// Price of one unit in cents
    pub cost: u64,
    pub amount_available: u64,
    /// Owning seller
    pub seller_id: u64,
}

impl OwnedResource for StoredProduct {
    fn owner_user_id(&self) -> u64 {
        self.seller_id
    }

    fn resource_name(&self) -> String {
        format!("product {}", self.product_id)
    }
}

/// Fields supplied when listing a product.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub product_name: String,
    pub cost: i64,
    pub amount_available: i64,
}

/// Partial update; `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct ProductPatch {
    pub product_name: Option<String>,
    pub cost: Option<i64>,
    pub amount_available: Option<i64>,
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// Business-rule rejection; the message is shown to the caller
    #[error("{0}")]
    Invalid(String),

    #[error("Product {0} not found")]
    NotFound(u64),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<redb::TableError> for CatalogError {
    fn from(e: redb::TableError) -> Self {
        CatalogError::Storage(e.into())
    }
}

impl From<redb::StorageError> for CatalogError {
    fn from(e: redb::StorageError) -> Self {
        CatalogError::Storage(e.into())
    }
}

impl From<redb::CommitError> for CatalogError {
    fn from(e: redb::CommitError) -> Self {
        CatalogError::Storage(e.into())
    }
}

fn invalid(message: impl Into<String>) -> CatalogError {
    CatalogError::Invalid(message.into())
}

fn positive(value: i64, field: &str) -> Result<u64, CatalogError> {
    u64::try_from(value)
        .ok()
        .filter(|v| *v > 0)
        .ok_or_else(|| invalid(format!("{field} must be greater than 0")))
}

fn non_negative(value: i64, field: &str) -> Result<u64, CatalogError> {
    u64::try_from(value).map_err(|_| invalid(format!("{field} must not be negative")))
}

fn ensure_name_free(
    index: &impl ReadableTable<&'static str, u64>,
    name: &str,
    except: Option<u64>,
) -> Result<(), CatalogError> {
    match index.get(name)?.map(|v| v.value()) {
        Some(existing) if Some(existing) != except => {
            Err(invalid(format!("Product name {name} is already taken")))
        }
        _ => Ok(()),
    }
}

/// Repository for the product catalog.
pub struct ProductRepository<'a> {
    store: &'a VendingStore,
}

impl<'a> ProductRepository<'a> {
    /// Create a new ProductRepository.
    pub fn new(store: &'a VendingStore) -> Self {
        Self { store }
    }

    /// Get a product by id.
    pub fn find(&self, product_id: u64) -> StorageResult<Option<StoredProduct>> {
        let read_txn = self.store.begin_read()?;
        let table = read_txn.open_table(PRODUCTS)?;
        get_record(&table, product_id)
    }

    /// Get a product by id, reporting absence as an error.
    pub fn get(&self, product_id: u64) -> Result<StoredProduct, CatalogError> {
        self.find(product_id)?
            .ok_or(CatalogError::NotFound(product_id))
    }

    /// List the whole catalog.
    pub fn list(&self) -> StorageResult<Vec<StoredProduct>> {
        let read_txn = self.store.begin_read()?;
        let table = read_txn.open_table(PRODUCTS)?;
        all_records(&table)
    }

    /// List the products a seller owns.
    pub fn list_by_seller(&self, seller_id: u64) -> StorageResult<Vec<StoredProduct>> {
        Ok(self
            .list()?
            .into_iter()
            .filter(|product| product.seller_id == seller_id)
            .collect())
    }

    /// True iff the product exists and belongs to `user_id`.
    pub fn verify_ownership(&self, product_id: u64, user_id: u64) -> StorageResult<bool> {
        Ok(self
            .find(product_id)?
            .is_some_and(|product| product.seller_id == user_id))
    }

    /// List a new product for a seller.
    pub fn create(&self, new_product: NewProduct, seller_id: u64) -> Result<StoredProduct, CatalogError> {
        if new_product.product_name.trim().is_empty() {
            return Err(invalid("Product name must not be empty"));
        }
        let cost = positive(new_product.cost, "Cost")?;
        let amount_available = positive(new_product.amount_available, "Amount available")?;

        let write_txn = self.store.begin_write()?;
        let product = {
            let users = write_txn.open_table(USERS)?;
            let seller: Option<StoredUser> = get_record(&users, seller_id)?;
            if !seller.is_some_and(|user| user.role == Role::Seller) {
                return Err(invalid("Only sellers can list products"));
            }

            let mut index = write_txn.open_table(PRODUCT_NAMES)?;
            ensure_name_free(&index, &new_product.product_name, None)?;

            let product = StoredProduct {
                product_id: next_id(&write_txn, PRODUCT_SEQUENCE)?,
                product_name: new_product.product_name,
                cost,
                amount_available,
                seller_id,
            };

            let mut table = write_txn.open_table(PRODUCTS)?;
            put_record(&mut table, product.product_id, &product)?;
            index.insert(product.product_name.as_str(), product.product_id)?;
            product
        };
        write_txn.commit()?;

        tracing::info!(
            product_id = product.product_id,
            seller_id,
            "product listed"
        );
        Ok(product)
    }

    /// Apply a partial update.
    pub fn update(&self, product_id: u64, patch: ProductPatch) -> Result<StoredProduct, CatalogError> {
        let write_txn = self.store.begin_write()?;
        let product = {
            let mut table = write_txn.open_table(PRODUCTS)?;
            let mut product: StoredProduct =
                get_record(&table, product_id)?.ok_or(CatalogError::NotFound(product_id))?;

            if let Some(cost) = patch.cost {
                product.cost = non_negative(cost, "Cost")?;
            }
            if let Some(amount) = patch.amount_available {
                product.amount_available = non_negative(amount, "Amount available")?;
            }
            if let Some(name) = patch.product_name {
                if name.trim().is_empty() {
                    return Err(invalid("Product name must not be empty"));
                }
                if name != product.product_name {
                    let mut index = write_txn.open_table(PRODUCT_NAMES)?;
                    ensure_name_free(&index, &name, Some(product_id))?;
                    index.remove(product.product_name.as_str())?;
                    index.insert(name.as_str(), product_id)?;
                    product.product_name = name;
                }
            }

            put_record(&mut table, product_id, &product)?;
            product
        };
        write_txn.commit()?;

        tracing::info!(product_id, "product updated");
        Ok(product)
    }

    /// Delete a product.
    pub fn delete(&self, product_id: u64) -> Result<StoredProduct, CatalogError> {
        let write_txn = self.store.begin_write()?;
        let product = {
            let mut table = write_txn.open_table(PRODUCTS)?;
            let product: StoredProduct =
                get_record(&table, product_id)?.ok_or(CatalogError::NotFound(product_id))?;
            table.remove(product_id)?;

            let mut index = write_txn.open_table(PRODUCT_NAMES)?;
            index.remove(product.product_name.as_str())?;
            product
        };
        write_txn.commit()?;

        tracing::info!(product_id, "product deleted");
        Ok(product)
    }

    /// Delete every product a seller owns, returning how many were removed.
    pub fn delete_all_by_seller(&self, seller_id: u64) -> StorageResult<usize> {
        let write_txn = self.store.begin_write()?;
        let removed = delete_by_seller_in(&write_txn, seller_id)?;
        write_txn.commit()?;
        Ok(removed)
    }
}

/// Remove a seller's products inside an open write transaction.
pub(crate) fn delete_by_seller_in(txn: &WriteTransaction, seller_id: u64) -> StorageResult<usize> {
    let mut table = txn.open_table(PRODUCTS)?;
    let owned: Vec<StoredProduct> = all_records::<StoredProduct, _>(&table)?
        .into_iter()
        .filter(|product| product.seller_id == seller_id)
        .collect();

    let mut index = txn.open_table(PRODUCT_NAMES)?;
    for product in &owned {
        table.remove(product.product_id)?;
        index.remove(product.product_name.as_str())?;
    }

    if !owned.is_empty() {
        tracing::debug!(seller_id, removed = owned.len(), "seller products removed");
    }
    Ok(owned.len())
}
