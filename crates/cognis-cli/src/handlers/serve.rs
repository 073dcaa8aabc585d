//! Runs the A2A HTTP server alongside the priority broker and this
//! agent's heartbeat sender — the three long-running pieces a gateway
//! process needs up before it can participate in the platform.

use std::sync::Arc;

use anyhow::Result;
use cognis_index::{Database, LogClient};
use cognis_runtime::{HeartbeatSender, PriorityBroker};
use cognis_sdk::Brain;
use cognis_types::AgentStatus;
use tokio::net::TcpListener;

use crate::config::Config;

pub async fn handle(db: Arc<Database>, config: Config, bind_override: Option<String>) -> Result<()> {
    let bind_addr = bind_override.unwrap_or(config.bind_addr.clone());
    let agent_name = config.brain.agent_name.clone();

    let brain = Arc::new(Brain::new(db.clone(), config.brain));
    let log = LogClient::new(db);
    let runtime_config = cognis_runtime::Config::default();

    let broker = PriorityBroker::start(log.clone(), runtime_config.clone(), &agent_name)?;
    let heartbeat = HeartbeatSender::start(log, agent_name.clone(), runtime_config, || AgentStatus::Idle);

    let listener = TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, agent = %agent_name, "cognis gateway listening");

    let result = axum::serve(listener, brain.router()).with_graceful_shutdown(shutdown_signal()).await;

    heartbeat.stop();
    broker.stop();
    result.map_err(Into::into)
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
