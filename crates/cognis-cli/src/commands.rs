//! The subcommand dispatcher: resolves the data directory and config
//! once, then hands off to a thin `handlers::*` function per subcommand.

use std::sync::Arc;

use anyhow::Result;
use clap::CommandFactory;
use cognis_index::Database;

use crate::args::{Cli, Commands};
use crate::config::{resolve_data_dir, Config};
use crate::handlers;

pub async fn run(cli: Cli) -> Result<()> {
    let Some(command) = cli.command else {
        Cli::command().print_help().ok();
        println!();
        return Ok(());
    };

    let format = cli.format;
    let data_dir = resolve_data_dir(cli.data_dir.as_deref())?;
    std::fs::create_dir_all(&data_dir)?;
    let config = Config::load(&data_dir)?;
    let db = Arc::new(Database::open(&data_dir.join("cognis.db"))?);

    match command {
        Commands::Serve { bind } => handlers::serve::handle(db, config, bind).await,
        Commands::AgentCard => handlers::agent_card::handle(db, config),
        Commands::Metrics => handlers::metrics::handle(db, config, format),
        Commands::Dlq { command } => handlers::dlq::handle(db, command, format),
        Commands::Templates { command } => handlers::templates::handle(db, command, format),
    }
}
