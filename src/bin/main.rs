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

use bank_ledger::{AccountNumber, Ledger, LedgerError, telemetry};
use clap::Parser;
use csv::{ReaderBuilder, Trim, Writer};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::PathBuf;
use std::process;
use tracing::warn;

/// Bank Ledger - Replay a CSV of ledger commands
///
/// Applies each command to a fresh in-memory ledger and writes the resulting
/// accounts to stdout. Rejected commands are logged to stderr and skipped.
#[derive(Parser, Debug)]
#[command(name = "bank-ledger")]
#[command(about = "Replays ledger commands from a CSV file", long_about = None)]
struct Args {
    /// Path to CSV file with commands
    ///
    /// Expected format: op,account,to,name,amount
    /// Example: cargo run --bin bank-ledger -- commands.csv > accounts.csv
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Emit logs as JSON
    #[arg(long, env = "LEDGER_LOG_JSON")]
    log_json: bool,
}

fn main() {
    let args = Args::parse();

    if let Err(e) = telemetry::init_tracing(args.log_json) {
        eprintln!("Error installing log subscriber: {}", e);
        process::exit(1);
    }

    let file = match File::open(&args.input) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Error opening file '{}': {}", args.input.display(), e);
            process::exit(1);
        }
    };

    let ledger = match replay_commands(BufReader::new(file)) {
        Ok(ledger) => ledger,
        Err(e) => {
            eprintln!("Error processing commands: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = write_accounts(&ledger, std::io::stdout()) {
        eprintln!("Error writing output: {}", e);
        process::exit(1);
    }
}

/// Raw CSV record matching the input format.
///
/// Fields: `op, account, to, name, amount`
#[derive(Debug, Deserialize)]
struct CsvRecord {
    op: String,
    account: i64,
    #[serde(deserialize_with = "csv::invalid_option")]
    to: Option<i64>,
    name: Option<String>,
    #[serde(deserialize_with = "csv::invalid_option")]
    amount: Option<Decimal>,
}

#[derive(Debug)]
enum Command {
    Create {
        account: AccountNumber,
        name: String,
        balance: Decimal,
    },
    Deposit {
        account: AccountNumber,
        amount: Decimal,
    },
    Withdraw {
        account: AccountNumber,
        amount: Decimal,
    },
    Transfer {
        from: AccountNumber,
        to: AccountNumber,
        amount: Decimal,
    },
}

impl CsvRecord {
    /// Converts CSV record to a ledger command.
    ///
    /// Returns `None` for unknown operations or missing required fields.
    fn into_command(self) -> Option<Command> {
        let account = AccountNumber::try_from(self.account).ok()?;

        match self.op.to_lowercase().as_str() {
            "create" => Some(Command::Create {
                account,
                name: self.name?,
                balance: self.amount.unwrap_or(Decimal::ZERO),
            }),
            "deposit" => Some(Command::Deposit {
                account,
                amount: self.amount?,
            }),
            "withdraw" | "withdrawal" => Some(Command::Withdraw {
                account,
                amount: self.amount?,
            }),
            "transfer" => Some(Command::Transfer {
                from: account,
                to: AccountNumber::try_from(self.to?).ok()?,
                amount: self.amount?,
            }),
            _ => None,
        }
    }
}

fn apply(ledger: &Ledger, command: Command) -> Result<(), LedgerError> {
    match command {
        Command::Create {
            account,
            name,
            balance,
        } => ledger.create_account(account, &name, balance).map(drop),
        Command::Deposit { account, amount } => ledger.deposit(account, amount).map(drop),
        Command::Withdraw { account, amount } => ledger.withdraw(account, amount).map(drop),
        Command::Transfer { from, to, amount } => ledger.transfer(from, to, amount).map(drop),
    }
}

/// Replay commands from a CSV reader into a fresh ledger.
///
/// Rows are streamed, so the input may be arbitrarily large. Malformed rows
/// and rejected commands are logged and skipped.
///
/// # CSV Format
///
/// Expected columns: `op, account, to, name, amount`
/// - `op`: create, deposit, withdraw, transfer
/// - `account`: Account number (source account for transfers)
/// - `to`: Destination account number (transfers only)
/// - `name`: Holder name (create only)
/// - `amount`: Decimal amount; initial balance for create (defaults to 0)
///
/// # Example
///
/// ```csv
/// op,account,to,name,amount
/// create,1,,Alice,100
/// create,2,,Bob,
/// transfer,1,2,,40
/// ```
///
/// # Errors
///
/// Returns a CSV error if the reader fails or the CSV structure is invalid.
pub fn replay_commands<R: Read>(reader: R) -> Result<Ledger, csv::Error> {
    let ledger = Ledger::new();

    let mut rdr = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .has_headers(true)
        .from_reader(reader);

    for (index, result) in rdr.deserialize::<CsvRecord>().enumerate() {
        let row = index + 1;
        match result {
            Ok(record) => {
                let Some(command) = record.into_command() else {
                    warn!(row, "skipping invalid command record");
                    continue;
                };

                // Mutations are applied once; a rejected row is not retried.
                if let Err(e) = apply(&ledger, command) {
                    warn!(row, error = %e, "skipping rejected command");
                }
            }
            Err(e) => {
                warn!(row, error = %e, "skipping malformed row");
            }
        }
    }

    Ok(ledger)
}

#[derive(Debug, Serialize)]
struct AccountRow<'a> {
    account: u32,
    name: &'a str,
    balance: String,
}

/// Write accounts to a CSV writer, ordered by account number.
///
/// # CSV Format
///
/// Columns: `account, name, balance`
///
/// ```csv
/// account,name,balance
/// 1,Alice,60.0000
/// 2,Bob,40.0000
/// ```
///
/// # Errors
///
/// Returns a CSV error if writing fails.
pub fn write_accounts<W: Write>(ledger: &Ledger, writer: W) -> Result<(), csv::Error> {
    let mut wtr = Writer::from_writer(writer);

    for account in ledger.list_accounts() {
        wtr.serialize(AccountRow {
            account: account.account_number().0,
            name: account.name(),
            balance: format!("{:.4}", account.balance().round_dp(4)),
        })?;
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::io::Cursor;

    fn balance(ledger: &Ledger, number: u32) -> Decimal {
        ledger.get_account(AccountNumber(number)).unwrap().balance()
    }

    #[test]
    fn replay_create_and_deposit() {
        let csv = "op,account,to,name,amount\n\
                   create,100,,Alice,0\n\
                   deposit,100,,,50\n";

        let ledger = replay_commands(Cursor::new(csv)).unwrap();

        assert_eq!(ledger.list_accounts().len(), 1);
        assert_eq!(balance(&ledger, 100), dec!(50));
        assert_eq!(ledger.transaction_count(), 1);
    }

    #[test]
    fn replay_transfer() {
        let csv = "op,account,to,name,amount\n\
                   create,1,,Alice,100\n\
                   create,2,,Bob,\n\
                   transfer,1,2,,40\n";

        let ledger = replay_commands(Cursor::new(csv)).unwrap();

        assert_eq!(balance(&ledger, 1), dec!(60));
        assert_eq!(balance(&ledger, 2), dec!(40));
        assert_eq!(ledger.dashboard_stats().active_transfers, 1);
    }

    #[test]
    fn rejected_commands_are_skipped() {
        let csv = "op,account,to,name,amount\n\
                   create,200,,Bob,0\n\
                   withdraw,200,,,10\n\
                   create,200,,Impostor,5\n\
                   transfer,200,200,,1\n";

        let ledger = replay_commands(Cursor::new(csv)).unwrap();

        let bob = ledger.get_account(AccountNumber(200)).unwrap();
        assert_eq!(bob.name(), "Bob");
        assert_eq!(bob.balance(), dec!(0));
        assert_eq!(ledger.transaction_count(), 0);
    }

    #[test]
    fn parse_with_whitespace() {
        let csv = "op,account,to,name,amount\n create , 7 , , Carol , 12.5 \n";

        let ledger = replay_commands(Cursor::new(csv)).unwrap();

        let carol = ledger.get_account(AccountNumber(7)).unwrap();
        assert_eq!(carol.name(), "Carol");
        assert_eq!(carol.balance(), dec!(12.5));
    }

    #[test]
    fn skip_malformed_rows() {
        let csv = "op,account,to,name,amount\n\
                   create,1,,Alice,10\n\
                   invalid,row,data,here,x\n\
                   deposit,-3,,,5\n\
                   create,2,,Bob,20\n";

        let ledger = replay_commands(Cursor::new(csv)).unwrap();

        assert_eq!(ledger.list_accounts().len(), 2);
    }

    #[test]
    fn write_accounts_sorted_with_four_decimals() {
        let csv = "op,account,to,name,amount\n\
                   create,3,,Carol,1.5\n\
                   create,1,,Alice,100\n";
        let ledger = replay_commands(Cursor::new(csv)).unwrap();

        let mut output = Vec::new();
        write_accounts(&ledger, &mut output).unwrap();

        let output = String::from_utf8(output).unwrap();
        assert_eq!(
            output,
            "account,name,balance\n1,Alice,100.0000\n3,Carol,1.5000\n"
        );
    }
}
