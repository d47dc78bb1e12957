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

//! # Bank Ledger
//!
//! An in-memory banking back-office core: accounts, deposits, withdrawals,
//! atomic transfers between accounts, and dashboard statistics.
//!
//! ## Core Components
//!
//! - [`Ledger`]: Owns accounts and the transaction log; the only place balances change
//! - [`Account`]: Snapshot of a numbered, named balance holder
//! - [`Transaction`]: Immutable record of one balance change, typed by [`TransactionKind`]
//! - [`LedgerError`]: Reasons an operation is rejected
//!
//! ## Example
//!
//! ```
//! use bank_ledger::{AccountNumber, Ledger};
//! use rust_decimal_macros::dec;
//!
//! let ledger = Ledger::new();
//! ledger.create_account(AccountNumber(1), "Alice", dec!(100)).unwrap();
//! ledger.create_account(AccountNumber(2), "Bob", dec!(0)).unwrap();
//!
//! let outcome = ledger.transfer(AccountNumber(1), AccountNumber(2), dec!(40)).unwrap();
//! assert_eq!(outcome.from.balance(), dec!(60));
//! assert_eq!(outcome.to.balance(), dec!(40));
//! assert_eq!(ledger.dashboard_stats().active_transfers, 1);
//! ```
//!
//! ## Thread Safety
//!
//! A [`Ledger`] is `Send + Sync`; share it as `Arc<Ledger>`. Mutations are
//! serialized, reads see consistent snapshots.
//!
//! ## Durability
//!
//! None. All state is lost when the owning process exits.

pub mod account;
mod base;
pub mod error;
#[cfg(feature = "server")]
pub mod http;
mod ledger;
mod stats;
pub mod telemetry;
mod transaction;
mod transaction_log;

pub use account::Account;
pub use base::{AccountId, AccountNumber, TransactionId};
pub use error::{InputError, LedgerError};
pub use ledger::{BalanceUpdate, Ledger, TransferOutcome};
pub use stats::DashboardStats;
pub use transaction::{Counterparty, Transaction, TransactionKind, TransactionView};
