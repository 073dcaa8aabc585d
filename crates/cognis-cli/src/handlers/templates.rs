use std::sync::Arc;

use anyhow::{anyhow, Result};
use cognis_index::{Database, TemplateStore};
use cognis_types::{epoch_seconds, TemplateStatus};

use crate::args::{OutputFormat, TemplateCommand};

pub fn handle(db: Arc<Database>, command: TemplateCommand, format: OutputFormat) -> Result<()> {
    let store = TemplateStore::new(db);

    match command {
        TemplateCommand::List { task_type } => list(&store, task_type.as_deref(), format),
        TemplateCommand::Promote { template_id } => transition(&store, &template_id, TemplateStatus::Promoted),
        TemplateCommand::Deprecate { template_id } => transition(&store, &template_id, TemplateStatus::Deprecated),
    }
}

fn list(store: &TemplateStore, task_type: Option<&str>, format: OutputFormat) -> Result<()> {
    let templates = store.list_all()?;
    let templates: Vec<_> = match task_type {
        Some(task_type) => templates.into_iter().filter(|t| t.task_type == task_type).collect(),
        None => templates,
    };

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&templates)?),
        OutputFormat::Plain if templates.is_empty() => println!("no templates"),
        OutputFormat::Plain => {
            for template in templates {
                println!(
                    "{}  {:?}  confidence={:.2}  task_type={}  name={}",
                    template.id, template.status, template.confidence, template.task_type, template.name
                );
            }
        }
    }
    Ok(())
}

fn transition(store: &TemplateStore, template_id: &str, status: TemplateStatus) -> Result<()> {
    let id: cognis_types::Id = template_id.parse().map_err(|_| anyhow!("malformed template id: {template_id}"))?;
    let template = store.get(&id)?.ok_or_else(|| anyhow!("no template with id {template_id}"))?;
    store.update_status_and_confidence(&id, status, template.confidence, epoch_seconds())?;
    println!("{template_id} -> {status:?}");
    Ok(())
}
