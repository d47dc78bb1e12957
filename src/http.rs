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

//! JSON-over-HTTP binding for the ledger.
//!
//! ```bash
//! # Create an account
//! curl -X POST http://localhost:3000/accounts \
//!   -H "Content-Type: application/json" \
//!   -d '{"accountNumber": 100, "name": "Alice", "balance": "0"}'
//!
//! # Deposit
//! curl -X POST http://localhost:3000/accounts/100/deposit \
//!   -H "Content-Type: application/json" \
//!   -d '{"amount": "50.00"}'
//!
//! # Transfer
//! curl -X POST http://localhost:3000/transfers \
//!   -H "Content-Type: application/json" \
//!   -d '{"fromAccountNumber": 100, "toAccountNumber": 200, "amount": "10"}'
//!
//! # Recent transactions and dashboard
//! curl 'http://localhost:3000/transactions?limit=5'
//! curl http://localhost:3000/stats
//! ```
//!
//! Mutations are never retried here; a client that retries a deposit may
//! apply it twice.

use crate::{
    Account, AccountNumber, BalanceUpdate, DashboardStats, Ledger, LedgerError, TransactionId,
    TransactionView, TransferOutcome,
};
use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

/// Number of transactions returned by `GET /transactions` without `limit`.
pub const DEFAULT_RECENT_LIMIT: usize = 10;

// === Request/Response DTOs ===

/// Account numbers arrive as plain integers and are range-checked here.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccountRequest {
    pub account_number: i64,
    pub name: String,
    #[serde(default)]
    pub balance: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct AmountRequest {
    pub amount: Decimal,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    pub from_account_number: i64,
    pub to_account_number: i64,
    pub amount: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct RecentQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceResponse {
    pub account: Account,
    pub new_balance: Decimal,
    pub transaction_id: TransactionId,
}

impl From<BalanceUpdate> for BalanceResponse {
    fn from(update: BalanceUpdate) -> Self {
        Self {
            account: update.account,
            new_balance: update.new_balance,
            transaction_id: update.transaction_id,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferResponse {
    pub from_account: Account,
    pub to_account: Account,
    pub transaction_id: TransactionId,
}

impl From<TransferOutcome> for TransferResponse {
    fn from(outcome: TransferOutcome) -> Self {
        Self {
            from_account: outcome.from,
            to_account: outcome.to,
            transaction_id: outcome.transaction_id,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub accounts: usize,
    pub transactions: usize,
}

/// Response body for errors.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

// === Application State ===

/// Shared application state containing the ledger.
#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<Ledger>,
}

// === Error Handling ===

/// Converts ledger errors and extractor rejections into HTTP responses.
pub enum AppError {
    Ledger(LedgerError),
    /// Body, path or query could not be parsed; reported as `INVALID_INPUT`.
    Malformed(String),
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        AppError::Ledger(err)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Malformed(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::Malformed(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Malformed(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let err = match self {
            AppError::Ledger(err) => err,
            AppError::Malformed(detail) => {
                warn!(code = "INVALID_INPUT", error = %detail, "malformed request");
                return (
                    StatusCode::BAD_REQUEST,
                    Json(ErrorResponse {
                        error: format!("invalid input: {detail}"),
                        code: "INVALID_INPUT".to_string(),
                    }),
                )
                    .into_response();
            }
        };

        let (status, code) = match &err {
            LedgerError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "INVALID_INPUT"),
            LedgerError::SameAccountTransfer => {
                (StatusCode::BAD_REQUEST, "SAME_ACCOUNT_TRANSFER")
            }
            LedgerError::AccountNotFound(_) => (StatusCode::NOT_FOUND, "ACCOUNT_NOT_FOUND"),
            LedgerError::DuplicateAccount(_) => (StatusCode::CONFLICT, "DUPLICATE_ACCOUNT"),
            LedgerError::InsufficientFunds => {
                (StatusCode::UNPROCESSABLE_ENTITY, "INSUFFICIENT_FUNDS")
            }
        };

        warn!(%code, error = %err, "request rejected");
        (
            status,
            Json(ErrorResponse {
                error: err.to_string(),
                code: code.to_string(),
            }),
        )
            .into_response()
    }
}

// === Handlers ===

/// GET /health
async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        accounts: state.ledger.account_count(),
        transactions: state.ledger.transaction_count(),
    })
}

/// POST /accounts - Open an account.
async fn create_account(
    State(state): State<AppState>,
    payload: Result<Json<CreateAccountRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Account>), AppError> {
    let Json(request) = payload?;
    let number = AccountNumber::try_from(request.account_number)?;
    let account = state
        .ledger
        .create_account(number, &request.name, request.balance)?;
    Ok((StatusCode::CREATED, Json(account)))
}

/// GET /accounts - List all accounts by ascending number.
async fn list_accounts(State(state): State<AppState>) -> Json<Vec<Account>> {
    Json(state.ledger.list_accounts())
}

/// GET /accounts/{number} - Get account by number.
async fn get_account(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<Account>, AppError> {
    let Path(number) = path?;
    let number = AccountNumber::try_from(number)?;
    state
        .ledger
        .get_account(number)
        .map(Json)
        .ok_or(AppError::Ledger(LedgerError::AccountNotFound(number)))
}

/// POST /accounts/{number}/deposit
async fn deposit(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<AmountRequest>, JsonRejection>,
) -> Result<Json<BalanceResponse>, AppError> {
    let Path(number) = path?;
    let Json(request) = payload?;
    let number = AccountNumber::try_from(number)?;
    let update = state.ledger.deposit(number, request.amount)?;
    Ok(Json(update.into()))
}

/// POST /accounts/{number}/withdraw
async fn withdraw(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<AmountRequest>, JsonRejection>,
) -> Result<Json<BalanceResponse>, AppError> {
    let Path(number) = path?;
    let Json(request) = payload?;
    let number = AccountNumber::try_from(number)?;
    let update = state.ledger.withdraw(number, request.amount)?;
    Ok(Json(update.into()))
}

/// POST /transfers
async fn transfer(
    State(state): State<AppState>,
    payload: Result<Json<TransferRequest>, JsonRejection>,
) -> Result<Json<TransferResponse>, AppError> {
    let Json(request) = payload?;
    let from = AccountNumber::try_from(request.from_account_number)?;
    let to = AccountNumber::try_from(request.to_account_number)?;
    let outcome = state.ledger.transfer(from, to, request.amount)?;
    Ok(Json(outcome.into()))
}

/// GET /transactions?limit=N
async fn recent_transactions(
    State(state): State<AppState>,
    query: Result<Query<RecentQuery>, QueryRejection>,
) -> Result<Json<Vec<TransactionView>>, AppError> {
    let Query(query) = query?;
    let limit = query.limit.unwrap_or(DEFAULT_RECENT_LIMIT);
    Ok(Json(state.ledger.recent_transactions(limit)))
}

/// GET /stats
async fn dashboard_stats(State(state): State<AppState>) -> Json<DashboardStats> {
    Json(state.ledger.dashboard_stats())
}

// === Router ===

pub fn router(ledger: Arc<Ledger>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/accounts", get(list_accounts).post(create_account))
        .route("/accounts/{number}", get(get_account))
        .route("/accounts/{number}/deposit", post(deposit))
        .route("/accounts/{number}/withdraw", post(withdraw))
        .route("/transfers", post(transfer))
        .route("/transactions", get(recent_transactions))
        .route("/stats", get(dashboard_stats))
        .with_state(AppState { ledger })
}
