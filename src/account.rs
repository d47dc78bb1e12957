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

//! Account records.
//!
//! An [`Account`] returned by the ledger is a snapshot: later operations do
//! not change it. Balance mutation is crate-private and goes through a
//! check-then-apply pair so that multi-account operations can validate every
//! leg before writing any of them.
//!
//! # Example
//!
//! ```
//! use bank_ledger::{AccountNumber, Ledger};
//! use rust_decimal_macros::dec;
//!
//! let ledger = Ledger::new();
//! let account = ledger.create_account(AccountNumber(1), "Alice", dec!(0)).unwrap();
//! assert_eq!(account.balance(), dec!(0));
//! ```

use crate::base::{AccountId, AccountNumber};
use crate::error::{InputError, LedgerError};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::ser::{Serialize, SerializeStruct, Serializer};

/// Longest accepted holder name, in characters.
pub const MAX_NAME_LEN: usize = 50;

/// A named, numbered balance holder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    id: AccountId,
    account_number: AccountNumber,
    name: String,
    balance: Decimal,
    created_at: DateTime<Utc>,
}

impl Account {
    const DECIMAL_PRECISION: u32 = 4;

    /// Builds a validated account. Uniqueness of the number is the ledger's job.
    pub(crate) fn open(
        account_number: AccountNumber,
        name: &str,
        initial_balance: Decimal,
        created_at: DateTime<Utc>,
    ) -> Result<Self, LedgerError> {
        if !account_number.is_valid() {
            return Err(InputError::InvalidAccountNumber.into());
        }
        let name = validate_name(name)?;
        if initial_balance < Decimal::ZERO {
            return Err(InputError::NegativeBalance.into());
        }

        let account = Self {
            id: AccountId::generate(),
            account_number,
            name: name.to_owned(),
            balance: initial_balance,
            created_at,
        };
        account.assert_invariants();
        Ok(account)
    }

    pub fn id(&self) -> AccountId {
        self.id
    }

    pub fn account_number(&self) -> AccountNumber {
        self.account_number
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn balance(&self) -> Decimal {
        self.balance
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn assert_invariants(&self) {
        debug_assert!(
            self.balance >= Decimal::ZERO,
            "Invariant violated: balance went negative: {}",
            self.balance
        );
    }

    /// Balance after crediting `amount`, without applying it.
    pub(crate) fn credited(&self, amount: Decimal) -> Result<Decimal, LedgerError> {
        validate_amount(amount)?;
        self.balance
            .checked_add(amount)
            .ok_or(LedgerError::InvalidInput(InputError::BalanceOverflow))
    }

    /// Balance after debiting `amount`, without applying it.
    pub(crate) fn debited(&self, amount: Decimal) -> Result<Decimal, LedgerError> {
        validate_amount(amount)?;
        if self.balance < amount {
            return Err(LedgerError::InsufficientFunds);
        }
        Ok(self.balance - amount)
    }

    /// Applies a balance computed by [`credited`](Self::credited) or
    /// [`debited`](Self::debited).
    pub(crate) fn apply(&mut self, balance: Decimal) {
        self.balance = balance;
        self.assert_invariants();
    }
}

/// Trims the holder name and checks its length.
pub(crate) fn validate_name(name: &str) -> Result<&str, LedgerError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(InputError::EmptyName.into());
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(InputError::NameTooLong.into());
    }
    Ok(name)
}

pub(crate) fn validate_amount(amount: Decimal) -> Result<(), LedgerError> {
    if amount <= Decimal::ZERO {
        return Err(InputError::NonPositiveAmount.into());
    }
    Ok(())
}

impl Serialize for Account {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("Account", 5)?;
        state.serialize_field("id", &self.id)?;
        state.serialize_field("accountNumber", &self.account_number)?;
        state.serialize_field("name", &self.name)?;
        state.serialize_field(
            "balance",
            &self.balance.round_dp(Account::DECIMAL_PRECISION),
        )?;
        state.serialize_field("createdAt", &self.created_at)?;
        state.end()
    }
}
