// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Vending Machine Server - role-gated coin vending service
//!
//! Buyers deposit coins and buy products; sellers list and manage the
//! products they own. Every request past login is authorized by a signed
//! credential that must also match a live session.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Credentials, sessions and role guards
//! - `machine` - Coin arithmetic and the deposit/reset/buy engine
//! - `storage` - Users, products and sessions in an embedded redb file

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod machine;
pub mod state;
pub mod storage;
