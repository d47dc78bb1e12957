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

//! Error types for ledger operations.
//!
//! Every error is raised before the ledger writes anything, so a rejected
//! operation leaves accounts and the transaction log unchanged.

use crate::base::AccountNumber;
use thiserror::Error;

/// Ledger operation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Malformed or out-of-range argument
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InputError),

    /// Account number is already taken
    #[error("account {0} already exists")]
    DuplicateAccount(AccountNumber),

    /// No account with this number
    #[error("account {0} not found")]
    AccountNotFound(AccountNumber),

    /// Withdrawal or transfer would exceed the balance
    #[error("insufficient funds")]
    InsufficientFunds,

    /// Source and destination of a transfer are the same account
    #[error("cannot transfer to the same account")]
    SameAccountTransfer,
}

/// Reasons an argument is rejected as [`LedgerError::InvalidInput`].
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputError {
    #[error("account number must be a positive integer")]
    InvalidAccountNumber,

    #[error("name must not be empty")]
    EmptyName,

    #[error("name must be at most {max} characters", max = crate::account::MAX_NAME_LEN)]
    NameTooLong,

    #[error("amount must be positive")]
    NonPositiveAmount,

    #[error("initial balance must not be negative")]
    NegativeBalance,

    #[error("resulting balance is out of range")]
    BalanceOverflow,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        assert_eq!(
            LedgerError::DuplicateAccount(AccountNumber(100)).to_string(),
            "account 100 already exists"
        );
        assert_eq!(
            LedgerError::AccountNotFound(AccountNumber(7)).to_string(),
            "account 7 not found"
        );
        assert_eq!(LedgerError::InsufficientFunds.to_string(), "insufficient funds");
        assert_eq!(
            LedgerError::SameAccountTransfer.to_string(),
            "cannot transfer to the same account"
        );
        assert_eq!(
            LedgerError::from(InputError::NonPositiveAmount).to_string(),
            "invalid input: amount must be positive"
        );
        assert_eq!(
            InputError::NameTooLong.to_string(),
            "name must be at most 50 characters"
        );
    }

    #[test]
    fn errors_are_cloneable() {
        let error = LedgerError::InsufficientFunds;
        let cloned = error.clone();
        assert_eq!(error, cloned);
    }
}
