// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Vending Machine
//!
//! `coins` holds the pure money arithmetic; `engine` applies deposit, reset
//! and buy to stored users and products.

pub mod coins;
pub mod engine;

pub use coins::{CoinError, DENOMINATIONS, MAX_BALANCE};
pub use engine::{Purchase, VendingError, VendingMachine};
