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

//! The account ledger.
//!
//! The [`Ledger`] owns every account and the transaction log, and is the only
//! place balances change.
//!
//! # Operations
//!
//! - **create_account**: Opens an account, logging a deposit for a positive
//!   initial balance.
//! - **deposit** / **withdraw**: Credit or debit one account.
//! - **transfer**: Debit one account and credit another as a single unit.
//! - **list_accounts**, **recent_transactions**, **dashboard_stats**: Reads.
//!
//! # Thread Safety
//!
//! All state sits behind one [`RwLock`]. Each mutation holds the write lock
//! from validation through the log append, so no reader ever observes a
//! debited-but-not-credited transfer, and reads return consistent snapshots.
//! State lives only in memory and is lost when the process exits.

use crate::account::{self, Account};
use crate::base::{AccountId, AccountNumber, TransactionId};
use crate::error::LedgerError;
use crate::stats::DashboardStats;
use crate::transaction::{Counterparty, Transaction, TransactionKind, TransactionView};
use crate::transaction_log::TransactionLog;
use chrono::Utc;
use parking_lot::RwLock;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};
use tracing::{info, instrument};

/// Result of a single-account balance change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceUpdate {
    pub account: Account,
    pub new_balance: Decimal,
    pub transaction_id: TransactionId,
}

/// Result of a transfer: both accounts after the move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferOutcome {
    pub from: Account,
    pub to: Account,
    pub transaction_id: TransactionId,
}

#[derive(Debug, Default)]
struct LedgerState {
    /// Accounts indexed by number; iteration order is ascending number.
    accounts: BTreeMap<AccountNumber, Account>,
    /// Reverse index used to resolve transaction counterparties.
    numbers: HashMap<AccountId, AccountNumber>,
    transactions: TransactionLog,
}

impl LedgerState {
    fn account(&self, number: AccountNumber) -> Result<&Account, LedgerError> {
        self.accounts
            .get(&number)
            .ok_or(LedgerError::AccountNotFound(number))
    }

    fn account_mut(&mut self, number: AccountNumber) -> Result<&mut Account, LedgerError> {
        self.accounts
            .get_mut(&number)
            .ok_or(LedgerError::AccountNotFound(number))
    }

    fn counterparty(&self, id: Option<AccountId>) -> Option<Counterparty> {
        let number = self.numbers.get(&id?)?;
        let account = self.accounts.get(number)?;
        Some(Counterparty {
            account_number: account.account_number(),
            name: account.name().to_owned(),
        })
    }
}

/// In-memory store of accounts and transactions.
///
/// # Invariants
///
/// - Account numbers are unique.
/// - No balance is ever negative.
/// - Every successful balance change appends exactly one transaction, under
///   the same lock as the change.
/// - Transfers conserve the sum of all balances.
#[derive(Debug, Default)]
pub struct Ledger {
    state: RwLock<LedgerState>,
}

impl Ledger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a new account.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::InvalidInput`] - Zero account number, empty or overlong
    ///   name, or negative initial balance.
    /// - [`LedgerError::DuplicateAccount`] - The number is already taken.
    #[instrument(name = "ledger.create_account", skip(self), err(level = "debug"))]
    pub fn create_account(
        &self,
        account_number: AccountNumber,
        name: &str,
        initial_balance: Decimal,
    ) -> Result<Account, LedgerError> {
        let now = Utc::now();
        let account = Account::open(account_number, name, initial_balance, now)?;

        let mut state = self.state.write();
        if state.accounts.contains_key(&account_number) {
            return Err(LedgerError::DuplicateAccount(account_number));
        }

        if initial_balance > Decimal::ZERO {
            state.transactions.append(
                TransactionKind::Deposit { to: account.id() },
                initial_balance,
                now,
            );
        }
        state.numbers.insert(account.id(), account_number);
        state.accounts.insert(account_number, account.clone());

        info!(account_id = %account.id(), "account created");
        Ok(account)
    }

    /// Looks up an account by number.
    ///
    /// Returns `None` if no account has this number.
    pub fn get_account(&self, account_number: AccountNumber) -> Option<Account> {
        self.state.read().accounts.get(&account_number).cloned()
    }

    /// Credits an account.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::InvalidInput`] - Non-positive amount, or the balance
    ///   would overflow.
    /// - [`LedgerError::AccountNotFound`] - No such account.
    #[instrument(name = "ledger.deposit", skip(self), err(level = "debug"))]
    pub fn deposit(
        &self,
        account_number: AccountNumber,
        amount: Decimal,
    ) -> Result<BalanceUpdate, LedgerError> {
        account::validate_amount(amount)?;

        let mut state = self.state.write();
        let account = state.account_mut(account_number)?;
        let new_balance = account.credited(amount)?;
        account.apply(new_balance);
        let account = account.clone();

        let transaction = state.transactions.append(
            TransactionKind::Deposit { to: account.id() },
            amount,
            Utc::now(),
        );

        info!(%new_balance, transaction_id = %transaction.id(), "deposit applied");
        Ok(BalanceUpdate {
            account,
            new_balance,
            transaction_id: transaction.id(),
        })
    }

    /// Debits an account.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::InvalidInput`] - Non-positive amount.
    /// - [`LedgerError::AccountNotFound`] - No such account.
    /// - [`LedgerError::InsufficientFunds`] - Amount exceeds the balance.
    #[instrument(name = "ledger.withdraw", skip(self), err(level = "debug"))]
    pub fn withdraw(
        &self,
        account_number: AccountNumber,
        amount: Decimal,
    ) -> Result<BalanceUpdate, LedgerError> {
        account::validate_amount(amount)?;

        let mut state = self.state.write();
        let account = state.account_mut(account_number)?;
        let new_balance = account.debited(amount)?;
        account.apply(new_balance);
        let account = account.clone();

        let transaction = state.transactions.append(
            TransactionKind::Withdraw { from: account.id() },
            amount,
            Utc::now(),
        );

        info!(%new_balance, transaction_id = %transaction.id(), "withdrawal applied");
        Ok(BalanceUpdate {
            account,
            new_balance,
            transaction_id: transaction.id(),
        })
    }

    /// Moves funds between two accounts.
    ///
    /// Both legs are validated before either is applied; the debit, credit
    /// and log entry happen under one write lock.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::InvalidInput`] - Non-positive amount, or the
    ///   destination balance would overflow.
    /// - [`LedgerError::SameAccountTransfer`] - Source equals destination.
    /// - [`LedgerError::AccountNotFound`] - Either account is missing.
    /// - [`LedgerError::InsufficientFunds`] - Amount exceeds the source balance.
    #[instrument(name = "ledger.transfer", skip(self), err(level = "debug"))]
    pub fn transfer(
        &self,
        from_account_number: AccountNumber,
        to_account_number: AccountNumber,
        amount: Decimal,
    ) -> Result<TransferOutcome, LedgerError> {
        account::validate_amount(amount)?;
        if from_account_number == to_account_number {
            return Err(LedgerError::SameAccountTransfer);
        }

        let mut state = self.state.write();
        let from = state.account(from_account_number)?;
        let to = state.account(to_account_number)?;
        let from_balance = from.debited(amount)?;
        let to_balance = to.credited(amount)?;
        let kind = TransactionKind::Transfer {
            from: from.id(),
            to: to.id(),
        };

        // Both legs are validated; apply them.
        let from = state.account_mut(from_account_number)?;
        from.apply(from_balance);
        let from = from.clone();
        let to = state.account_mut(to_account_number)?;
        to.apply(to_balance);
        let to = to.clone();

        let transaction = state.transactions.append(kind, amount, Utc::now());

        info!(transaction_id = %transaction.id(), "transfer applied");
        Ok(TransferOutcome {
            from,
            to,
            transaction_id: transaction.id(),
        })
    }

    /// Snapshot of all accounts ordered by ascending account number.
    pub fn list_accounts(&self) -> Vec<Account> {
        self.state.read().accounts.values().cloned().collect()
    }

    /// The `limit` most recent transactions, newest first, with counterparty
    /// names resolved now.
    pub fn recent_transactions(&self, limit: usize) -> Vec<TransactionView> {
        let state = self.state.read();
        state
            .transactions
            .recent(limit)
            .map(|&transaction| TransactionView {
                transaction,
                from_account: state.counterparty(transaction.kind().from_account_id()),
                to_account: state.counterparty(transaction.kind().to_account_id()),
            })
            .collect()
    }

    /// Looks up a logged transaction by ID.
    pub fn transaction(&self, id: TransactionId) -> Option<Transaction> {
        self.state.read().transactions.get(&id).copied()
    }

    /// Aggregates over the current state, recomputed on every call.
    pub fn dashboard_stats(&self) -> DashboardStats {
        let state = self.state.read();
        DashboardStats::compute(state.accounts.len(), state.transactions.iter())
    }

    /// Number of open accounts.
    pub fn account_count(&self) -> usize {
        self.state.read().accounts.len()
    }

    /// Number of logged transactions.
    pub fn transaction_count(&self) -> usize {
        self.state.read().transactions.len()
    }
}
