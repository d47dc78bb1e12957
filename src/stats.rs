// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Dashboard aggregates, derived by scanning the transaction log.
//!
//! Each balance is bounded, but a sum across accounts is not: monetary totals
//! saturate at [`Decimal::MAX`] instead of overflowing.

use crate::transaction::{Transaction, TransactionKind};
use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_accounts: usize,
    /// Sum of all deposit amounts, initial balances included. Saturates at
    /// [`Decimal::MAX`].
    pub total_deposits: Decimal,
    /// Sum of all withdrawal amounts. Saturates at [`Decimal::MAX`].
    pub total_withdrawals: Decimal,
    /// Number of transfer transactions.
    pub active_transfers: usize,
}

impl DashboardStats {
    pub(crate) fn compute<'a>(
        total_accounts: usize,
        transactions: impl IntoIterator<Item = &'a Transaction>,
    ) -> Self {
        transactions.into_iter().fold(
            Self {
                total_accounts,
                ..Self::default()
            },
            |mut stats, tx| {
                match tx.kind() {
                    TransactionKind::Deposit { .. } => {
                        stats.total_deposits = stats.total_deposits.saturating_add(tx.amount())
                    }
                    TransactionKind::Withdraw { .. } => {
                        stats.total_withdrawals = stats.total_withdrawals.saturating_add(tx.amount())
                    }
                    TransactionKind::Transfer { .. } => stats.active_transfers += 1,
                }
                stats
            },
        )
    }
}
