use std::sync::Arc;

use anyhow::Result;
use cognis_index::Database;
use cognis_sdk::Brain;

use crate::config::Config;

pub fn handle(db: Arc<Database>, config: Config) -> Result<()> {
    let brain = Brain::new(db, config.brain);
    println!("{}", serde_json::to_string_pretty(&brain.card()).expect("AgentCard always serializes"));
    Ok(())
}
