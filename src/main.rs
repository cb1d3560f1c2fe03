// SPDX-License-Identifier: MIT

use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use vedex::app::config::GlobalSettings;
use vedex::app::logging::setup_logging;
use vedex::domain::error::AppError;
use vedex::infrastructure::network::gateway::AlloyGateway;
use vedex::infrastructure::network::provider::ConnectionFactory;
use vedex::infrastructure::network::subgraph::SubgraphClient;
use vedex::services::store::command::Command;
use vedex::services::store::events::StoreEvent;
use vedex::services::store::{Store, StoreConfig, StoreContext};

#[derive(Parser, Debug)]
#[command(author, version, about = "vedex controller")]
struct Cli {
    /// Path to config file (default: config.{toml,yaml,...})
    #[arg(long)]
    config: Option<String>,

    /// Log as JSON instead of compact text
    #[arg(long, default_value_t = false)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let cli = Cli::parse();

    let settings = GlobalSettings::load_with_path(cli.config.as_deref())?;
    setup_logging(if settings.debug { "debug" } else { "info" }, cli.json_logs);

    let rpc_url = settings.http_provider()?;
    let wallet_key = settings.wallet_key_value()?;
    let provider = ConnectionFactory::http_with_signer(&rpc_url, &wallet_key)?;
    let gateway = Arc::new(AlloyGateway::new(
        provider,
        settings.account_address,
        settings.multicall_address(),
        Duration::from_millis(settings.receipt_poll_ms_value()),
        Duration::from_millis(settings.receipt_timeout_ms_value()),
    ));
    let indexer = Arc::new(SubgraphClient::new(&settings.subgraph_url()?)?);

    let ctx = StoreContext::new(StoreConfig::from_settings(&settings), gateway, indexer);
    let store = Store::new(ctx);
    let mut events = store.subscribe();

    tracing::info!(
        target: "main",
        account = %settings.account_address,
        chain_id = settings.chain_id,
        "Controller starting"
    );
    store.dispatch(Command::Configure).await;

    loop {
        match events.recv().await {
            Ok(StoreEvent::Error(message)) => {
                tracing::error!(target: "main", %message, "Store error");
            }
            Ok(event) => {
                tracing::debug!(target: "main", ?event, "Store event");
            }
            Err(tokio::sync::broadcast::error::RecvError::Lagged(missed)) => {
                tracing::warn!(target: "main", missed, "Event stream lagged");
            }
            Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
        }
    }
    Ok(())
}
