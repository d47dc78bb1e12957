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

//! Transaction records.
//!
//! A [`Transaction`] documents exactly one balance change. Which account
//! references it carries is decided by its [`TransactionKind`]:
//!
//! | Kind | `fromAccountId` | `toAccountId` |
//! |------|-----------------|---------------|
//! | Deposit | null | account |
//! | Withdraw | account | null |
//! | Transfer | source | destination |

use crate::base::{AccountId, AccountNumber, TransactionId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use serde::ser::{SerializeStruct, Serializer};

/// What a transaction did, with the accounts it touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionKind {
    Deposit { to: AccountId },
    Withdraw { from: AccountId },
    Transfer { from: AccountId, to: AccountId },
}

impl TransactionKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Deposit { .. } => "deposit",
            Self::Withdraw { .. } => "withdraw",
            Self::Transfer { .. } => "transfer",
        }
    }

    pub fn from_account_id(&self) -> Option<AccountId> {
        match self {
            Self::Deposit { .. } => None,
            Self::Withdraw { from } => Some(*from),
            Self::Transfer { from, .. } => Some(*from),
        }
    }

    pub fn to_account_id(&self) -> Option<AccountId> {
        match self {
            Self::Deposit { to } => Some(*to),
            Self::Withdraw { .. } => None,
            Self::Transfer { to, .. } => Some(*to),
        }
    }
}

/// Immutable record of a single balance-affecting event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transaction {
    id: TransactionId,
    kind: TransactionKind,
    amount: Decimal,
    created_at: DateTime<Utc>,
}

impl Transaction {
    pub(crate) fn new(kind: TransactionKind, amount: Decimal, created_at: DateTime<Utc>) -> Self {
        debug_assert!(amount > Decimal::ZERO, "transaction amount must be positive");
        Self {
            id: TransactionId::generate(),
            kind,
            amount,
            created_at,
        }
    }

    pub fn id(&self) -> TransactionId {
        self.id
    }

    pub fn kind(&self) -> TransactionKind {
        self.kind
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl Serialize for Transaction {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("Transaction", 6)?;
        state.serialize_field("id", &self.id)?;
        state.serialize_field("type", self.kind.name())?;
        state.serialize_field("fromAccountId", &self.kind.from_account_id())?;
        state.serialize_field("toAccountId", &self.kind.to_account_id())?;
        state.serialize_field("amount", &self.amount)?;
        state.serialize_field("createdAt", &self.created_at)?;
        state.end()
    }
}

/// The other side of a transaction, resolved when it is read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Counterparty {
    pub account_number: AccountNumber,
    pub name: String,
}

/// A transaction annotated with its counterparties.
///
/// A side is `None` when the kind has no such account or when the account
/// can no longer be resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionView {
    #[serde(flatten)]
    pub transaction: Transaction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_account: Option<Counterparty>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_account: Option<Counterparty>,
}
