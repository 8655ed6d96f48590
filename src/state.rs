// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::auth::CredentialAuthority;
use crate::storage::VendingStore;

#[derive(Clone)]
pub struct AppState {
    store: Arc<VendingStore>,
    credentials: Arc<CredentialAuthority>,
}

impl AppState {
    pub fn new(store: VendingStore, credentials: CredentialAuthority) -> Self {
        Self {
            store: Arc::new(store),
            credentials: Arc::new(credentials),
        }
    }

    pub fn store(&self) -> &VendingStore {
        &self.store
    }

    pub fn credentials(&self) -> &CredentialAuthority {
        &self.credentials
    }
}
