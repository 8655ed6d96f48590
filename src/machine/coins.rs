// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Coin arithmetic.
//!
//! The machine accepts and returns 5, 10, 20, 50 and 100 cent coins only.
//! The set is canonical, so greedy decomposition from the largest coin is
//! both exact (when any decomposition exists) and minimal.

/// Legal coin denominations in cents, largest first.
pub const DENOMINATIONS: [u64; 5] = [100, 50, 20, 10, 5];

/// Highest balance a buyer may hold, in cents. Keeps change bounded.
pub const MAX_BALANCE: u64 = 1_000_000;

/// Amount could not be paid out in legal coins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("{total} cannot be paid in legal coins ({remainder} left over)")]
pub struct CoinError {
    pub total: u64,
    pub remainder: u64,
}

/// True iff `amount` is a single legal coin.
pub fn is_legal_denomination(amount: u64) -> bool {
    DENOMINATIONS.contains(&amount)
}

/// True iff `total` is a non-negative combination of legal coins.
///
/// Every coin is a multiple of the smallest one.
pub fn is_exact_in_coins(total: u64) -> bool {
    total % SMALLEST_COIN == 0
}

const SMALLEST_COIN: u64 = DENOMINATIONS[DENOMINATIONS.len() - 1];

/// Count of each coin in the fewest-coin split of `total`, largest coin first.
pub fn coin_counts(total: u64) -> Result<[(u64, u64); 5], CoinError> {
    let mut remaining = total;
    let mut counts = [(0, 0); 5];
    for (slot, coin) in counts.iter_mut().zip(DENOMINATIONS) {
        *slot = (coin, remaining / coin);
        remaining %= coin;
    }
    if remaining != 0 {
        return Err(CoinError {
            total,
            remainder: remaining,
        });
    }
    Ok(counts)
}

/// Split `total` into the fewest legal coins, smallest coin first.
///
/// The output holds one entry per coin, so callers keep `total` within
/// [`MAX_BALANCE`].
pub fn decompose(total: u64) -> Result<Vec<u64>, CoinError> {
    let counts = coin_counts(total)?;
    Ok(counts
        .iter()
        .rev()
        .flat_map(|&(coin, count)| std::iter::repeat_n(coin, count as usize))
        .collect())
}
