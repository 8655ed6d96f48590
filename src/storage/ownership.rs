// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Ownership enforcement for seller-owned records.
//!
//! Missing records and records owned by someone else are both reported as
//! errors here; the API layer collapses the two into a single rejection so
//! non-owners cannot probe which ids exist.

use crate::auth::AuthenticatedUser;

use super::{StorageError, StorageResult};

/// Trait for resources that have an owner.
pub trait OwnedResource {
    /// Get the owner's user ID.
    fn owner_user_id(&self) -> u64;

    /// Short resource label used in error messages.
    fn resource_name(&self) -> String;
}

/// Trait for enforcing ownership on storage operations.
pub trait OwnershipEnforcer {
    /// Verify that the user owns this resource.
    ///
    /// # Errors
    /// Returns `StorageError::PermissionDenied` if the user doesn't own the resource.
    fn verify_ownership(&self, user: &AuthenticatedUser) -> StorageResult<()>;
}

impl<T: OwnedResource> OwnershipEnforcer for T {
    fn verify_ownership(&self, user: &AuthenticatedUser) -> StorageResult<()> {
        if self.owner_user_id() == user.user_id {
            Ok(())
        } else {
            Err(StorageError::PermissionDenied {
                user_id: user.user_id,
                resource: self.resource_name(),
            })
        }
    }
}

/// Extension trait for ownership verification on lookup results.
pub trait OwnershipCheck<T> {
    /// Verify ownership and return the resource if authorized.
    fn verify_owner(self, user: &AuthenticatedUser) -> StorageResult<T>;
}

impl<T: OwnedResource> OwnershipCheck<T> for Option<T> {
    fn verify_owner(self, user: &AuthenticatedUser) -> StorageResult<T> {
        match self {
            Some(resource) => {
                resource.verify_ownership(user)?;
                Ok(resource)
            }
            None => Err(StorageError::NotFound("resource".to_string())),
        }
    }
}

impl<T: OwnedResource> OwnershipCheck<T> for StorageResult<Option<T>> {
    fn verify_owner(self, user: &AuthenticatedUser) -> StorageResult<T> {
        self?.verify_owner(user)
    }
}
