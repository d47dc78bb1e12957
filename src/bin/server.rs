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

use anyhow::Context;
use bank_ledger::{Ledger, http, telemetry};
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

/// Bank Ledger API server
///
/// Serves the ledger over JSON/HTTP. State is held in memory only and is lost
/// when the server stops.
#[derive(Parser, Debug)]
#[command(name = "bank-ledger-server", version, long_about = None)]
struct Args {
    /// Address to listen on
    #[arg(long, env = "LEDGER_LISTEN", default_value = "127.0.0.1:3000")]
    listen: SocketAddr,

    /// Emit logs as JSON
    #[arg(long, env = "LEDGER_LOG_JSON")]
    log_json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    telemetry::init_tracing(args.log_json).context("installing log subscriber")?;

    let app = http::router(Arc::new(Ledger::new()));

    let listener = TcpListener::bind(args.listen)
        .await
        .with_context(|| format!("binding {}", args.listen))?;
    info!(addr = %listener.local_addr()?, "ledger API listening");
    warn!("ledger state is in memory only and is lost on shutdown");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving ledger API")?;

    info!("ledger API stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}
