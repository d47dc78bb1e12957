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

//! Append-only transaction log.
//!
//! Preserves insertion order and indexes entries by ID. Timestamps never go
//! backwards along the log, so reverse insertion order is newest-first.

use crate::base::TransactionId;
use crate::transaction::{Transaction, TransactionKind};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;

#[derive(Debug, Default)]
pub(crate) struct TransactionLog {
    /// Entries in insertion order.
    entries: Vec<Transaction>,

    /// Position of each entry in `entries`.
    positions: HashMap<TransactionId, usize>,
}

impl TransactionLog {
    /// Appends a new record and returns it.
    ///
    /// `now` is clamped to the newest entry's timestamp if the clock stepped
    /// backwards.
    pub fn append(
        &mut self,
        kind: TransactionKind,
        amount: Decimal,
        now: DateTime<Utc>,
    ) -> Transaction {
        let created_at = match self.entries.last() {
            Some(last) if last.created_at() > now => last.created_at(),
            _ => now,
        };
        let transaction = Transaction::new(kind, amount, created_at);

        let previous = self.positions.insert(transaction.id(), self.entries.len());
        debug_assert!(previous.is_none(), "duplicate transaction ID {}", transaction.id());
        self.entries.push(transaction);
        transaction
    }

    pub fn get(&self, id: &TransactionId) -> Option<&Transaction> {
        self.positions.get(id).map(|&index| &self.entries[index])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Transaction> {
        self.entries.iter()
    }

    /// The `limit` newest entries, newest first.
    pub fn recent(&self, limit: usize) -> impl Iterator<Item = &Transaction> {
        self.entries.iter().rev().take(limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::AccountId;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn deposit() -> TransactionKind {
        TransactionKind::Deposit {
            to: AccountId::generate(),
        }
    }

    #[test]
    fn append_preserves_order_and_indexes() {
        let mut log = TransactionLog::default();
        let now = Utc::now();
        let first = log.append(deposit(), dec!(1), now);
        let second = log.append(deposit(), dec!(2), now);

        assert_eq!(log.len(), 2);
        assert_eq!(log.get(&first.id()), Some(&first));
        assert_eq!(log.get(&second.id()), Some(&second));
        let amounts: Vec<_> = log.iter().map(Transaction::amount).collect();
        assert_eq!(amounts, vec![dec!(1), dec!(2)]);
    }

    #[test]
    fn timestamps_never_go_backwards() {
        let mut log = TransactionLog::default();
        let now = Utc::now();
        log.append(deposit(), dec!(1), now);
        let late = log.append(deposit(), dec!(2), now - Duration::seconds(30));

        assert_eq!(late.created_at(), now);
    }

    #[test]
    fn recent_is_newest_first_and_limited() {
        let mut log = TransactionLog::default();
        let now = Utc::now();
        for i in 1..=5 {
            log.append(deposit(), Decimal::from(i), now);
        }

        let amounts: Vec<_> = log.recent(3).map(Transaction::amount).collect();
        assert_eq!(amounts, vec![dec!(5), dec!(4), dec!(3)]);
        assert_eq!(log.recent(0).count(), 0);
        assert_eq!(log.recent(100).count(), 5);
    }

    #[test]
    fn unknown_id_is_absent() {
        let log = TransactionLog::default();
        assert!(log.get(&TransactionId::generate()).is_none());
    }
}
