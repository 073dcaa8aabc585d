use std::sync::Arc;

use anyhow::{anyhow, Result};
use cognis_index::{Database, DeadLetterStore};

use crate::args::{DlqCommand, OutputFormat};

pub fn handle(db: Arc<Database>, command: DlqCommand, format: OutputFormat) -> Result<()> {
    let store = DeadLetterStore::new(db);

    match command {
        DlqCommand::List { limit } => list(&store, limit, format),
        DlqCommand::Retry { task_id } => retry(&store, &task_id),
    }
}

fn list(store: &DeadLetterStore, limit: usize, format: OutputFormat) -> Result<()> {
    let letters: Vec<_> = store.list()?.into_iter().take(limit).collect();

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&letters)?),
        OutputFormat::Plain if letters.is_empty() => println!("no dead-lettered tasks"),
        OutputFormat::Plain => {
            for letter in letters {
                println!(
                    "{}  original={}  retries={}  dead_at={}  error={}",
                    letter.id, letter.original.id, letter.retry_count, letter.dead_at, letter.error
                );
            }
        }
    }
    Ok(())
}

fn retry(store: &DeadLetterStore, task_id: &str) -> Result<()> {
    let id: cognis_types::Id = task_id.parse().map_err(|_| anyhow!("malformed task id: {task_id}"))?;
    let letter = store.find(&id)?.ok_or_else(|| anyhow!("no dead letter with id {task_id}"))?;
    store.retry_dead_letter(&letter)?;
    println!("re-published {task_id}");
    Ok(())
}
