// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! ## Auth Flow
//!
//! 1. Client posts username and password to `/auth/login`
//! 2. Server verifies the argon2 hash, signs an HS256 credential and records
//!    a session carrying that exact token
//! 3. Client sends `Authorization: Bearer <token>` on later requests
//! 4. Server verifies signature and expiry, then requires a live session
//!    for the token before trusting the claims
//!
//! Logout deletes the session, so a logged-out token stops working even
//! though its signature is still valid.
//!
//! ## Roles
//!
//! - `buyer`: deposit, reset and buy
//! - `seller`: create and manage own products
//!
//! Clock skew tolerance is 60 seconds.

pub mod claims;
pub mod credentials;
pub mod error;
pub mod extractor;
pub mod password;
pub mod roles;

pub use claims::{AuthenticatedUser, Claims};
pub use credentials::{CredentialAuthority, CredentialConfig, IssuedCredential};
pub use error::AuthError;
pub use extractor::{authenticate, require_role, Auth, BuyerOnly, SellerOnly};
pub use roles::Role;
