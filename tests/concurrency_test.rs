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

//! Concurrency tests using parking_lot's built-in deadlock detector.
//!
//! Many threads hammer a shared ledger with mixed operations. Beyond the
//! absence of deadlocks, the tests check that money is conserved and that
//! no reader ever sees a half-applied transfer.

use bank_ledger::{AccountNumber, Ledger};
use parking_lot::deadlock;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

// === Deadlock Detection Infrastructure ===

/// Starts a background thread that checks for deadlocks.
/// Returns a handle to stop the detector.
fn start_deadlock_detector() -> Arc<AtomicBool> {
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = running.clone();

    thread::spawn(move || {
        while running_clone.load(Ordering::SeqCst) {
            thread::sleep(Duration::from_millis(100));
            let deadlocks = deadlock::check_deadlock();
            if !deadlocks.is_empty() {
                eprintln!("\n=== DEADLOCK DETECTED ===");
                for (i, threads) in deadlocks.iter().enumerate() {
                    eprintln!("\nDeadlock #{}", i + 1);
                    for t in threads {
                        eprintln!("Thread ID: {:?}", t.thread_id());
                        eprintln!("Backtrace:\n{:#?}", t.backtrace());
                    }
                }
                panic!("Deadlock detected! See output above for details.");
            }
        }
    });

    running
}

/// Stops the deadlock detector.
fn stop_deadlock_detector(running: Arc<AtomicBool>) {
    running.store(false, Ordering::SeqCst);
    thread::sleep(Duration::from_millis(150)); // Let detector thread exit
}

fn ledger_with_accounts(count: u32, balance: Decimal) -> Arc<Ledger> {
    let ledger = Ledger::new();
    for n in 1..=count {
        ledger
            .create_account(AccountNumber(n), &format!("holder-{n}"), balance)
            .unwrap();
    }
    Arc::new(ledger)
}

fn total_balance(ledger: &Ledger) -> Decimal {
    ledger.list_accounts().iter().map(|a| a.balance()).sum()
}

// === Tests ===

/// Test high contention on a single account with many threads.
#[test]
fn no_deadlock_high_contention_single_account() {
    let detector = start_deadlock_detector();
    let ledger = ledger_with_accounts(1, dec!(0));

    const NUM_THREADS: usize = 50;
    const OPS_PER_THREAD: usize = 100;

    let deposits = Arc::new(AtomicUsize::new(0));
    let withdrawals = Arc::new(AtomicUsize::new(0));
    let mut handles = Vec::with_capacity(NUM_THREADS);

    for _ in 0..NUM_THREADS {
        let ledger = ledger.clone();
        let deposits = deposits.clone();
        let withdrawals = withdrawals.clone();

        handles.push(thread::spawn(move || {
            for i in 0..OPS_PER_THREAD {
                match i % 3 {
                    0 => {
                        ledger.deposit(AccountNumber(1), dec!(10.00)).unwrap();
                        deposits.fetch_add(1, Ordering::SeqCst);
                    }
                    1 => {
                        if ledger.withdraw(AccountNumber(1), dec!(1.00)).is_ok() {
                            withdrawals.fetch_add(1, Ordering::SeqCst);
                        }
                    }
                    _ => {
                        let account = ledger.get_account(AccountNumber(1)).unwrap();
                        assert!(account.balance() >= Decimal::ZERO);
                        let _ = ledger.dashboard_stats();
                    }
                }
            }
        }));
    }

    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    stop_deadlock_detector(detector);

    let expected = Decimal::from(deposits.load(Ordering::SeqCst)) * dec!(10)
        - Decimal::from(withdrawals.load(Ordering::SeqCst));
    let account = ledger.get_account(AccountNumber(1)).unwrap();
    assert_eq!(account.balance(), expected);
    assert_eq!(
        ledger.transaction_count(),
        deposits.load(Ordering::SeqCst) + withdrawals.load(Ordering::SeqCst)
    );
}

/// Transfers in both directions between many accounts conserve money, and
/// concurrent readers always see the conserved total.
#[test]
fn concurrent_transfers_conserve_money() {
    let detector = start_deadlock_detector();

    const NUM_ACCOUNTS: u32 = 8;
    const NUM_WRITERS: u32 = 16;
    const OPS_PER_THREAD: u32 = 500;
    let ledger = ledger_with_accounts(NUM_ACCOUNTS, dec!(100));
    let expected_total = Decimal::from(NUM_ACCOUNTS) * dec!(100);

    let done = Arc::new(AtomicBool::new(false));
    let reader = {
        let ledger = ledger.clone();
        let done = done.clone();
        thread::spawn(move || {
            let mut snapshots = 0usize;
            loop {
                assert_eq!(total_balance(&ledger), expected_total);
                snapshots += 1;
                if done.load(Ordering::SeqCst) {
                    break snapshots;
                }
            }
        })
    };

    let writers: Vec<_> = (0..NUM_WRITERS)
        .map(|t| {
            let ledger = ledger.clone();
            thread::spawn(move || {
                for i in 0..OPS_PER_THREAD {
                    let from = (t + i) % NUM_ACCOUNTS + 1;
                    let to = (t * 3 + i * 7 + 1) % NUM_ACCOUNTS + 1;
                    let amount = Decimal::new(i64::from(i % 50 + 1), 1);
                    // Same-account pairs and overdrafts are expected rejections.
                    let _ = ledger.transfer(AccountNumber(from), AccountNumber(to), amount);
                }
            })
        })
        .collect();

    for handle in writers {
        handle.join().expect("Thread panicked");
    }
    done.store(true, Ordering::SeqCst);
    let snapshots = reader.join().expect("Reader panicked");

    stop_deadlock_detector(detector);

    assert!(snapshots > 0);
    assert_eq!(total_balance(&ledger), expected_total);
    for account in ledger.list_accounts() {
        assert!(account.balance() >= Decimal::ZERO);
    }
    assert_eq!(
        ledger.dashboard_stats().active_transfers,
        ledger.transaction_count() - NUM_ACCOUNTS as usize
    );
}

/// Racing creations of the same number: exactly one wins.
#[test]
fn concurrent_duplicate_creation_has_one_winner() {
    let detector = start_deadlock_detector();
    let ledger = Arc::new(Ledger::new());

    const NUM_THREADS: usize = 32;

    let handles: Vec<_> = (0..NUM_THREADS)
        .map(|t| {
            let ledger = ledger.clone();
            thread::spawn(move || {
                ledger
                    .create_account(AccountNumber(42), &format!("racer-{t}"), dec!(1))
                    .is_ok()
            })
        })
        .collect();

    let winners = handles
        .into_iter()
        .map(|h| h.join().expect("Thread panicked"))
        .filter(|&won| won)
        .count();

    stop_deadlock_detector(detector);

    assert_eq!(winners, 1);
    assert_eq!(ledger.account_count(), 1);
    assert_eq!(ledger.dashboard_stats().total_deposits, dec!(1));
}
