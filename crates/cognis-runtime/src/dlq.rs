//! DLQ retry sweep (C3). `send_to_dead_letter`/
//! `retry_dead_letter` themselves live on `cognis_index::DeadLetterStore`
//! as a single transaction; this module is the periodic caller that
//! walks the dead-letter tail and retries entries under a retry-count
//! ceiling.

use cognis_index::DeadLetterStore;
use cognis_types::DeadLetter;

/// Retry every dead letter with `retry_count < max_retries`, returning
/// the ids that were successfully republished. An individual republish
/// failure (e.g. the entry was already retried elsewhere) is logged and
/// skipped rather than aborting the sweep.
pub fn retry_eligible(store: &DeadLetterStore, max_retries: u32) -> crate::Result<Vec<cognis_types::Id>> {
    let mut retried = Vec::new();
    for letter in store.list()? {
        if letter.retry_count >= max_retries {
            continue;
        }
        match store.retry_dead_letter(&letter) {
            Ok(_) => retried.push(letter.id),
            Err(err) => {
                tracing::warn!(error = %err, id = %letter.id, "dead letter retry failed, leaving entry in place");
            }
        }
    }
    Ok(retried)
}

/// Dead letters that have exhausted `max_retries` — the operator's
/// "needs manual attention" view.
pub fn exhausted(store: &DeadLetterStore, max_retries: u32) -> crate::Result<Vec<DeadLetter>> {
    Ok(store
        .list()?
        .into_iter()
        .filter(|letter| letter.retry_count >= max_retries)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cognis_index::Database;
    use cognis_types::{Priority, TaskEnvelope, TaskType};
    use std::collections::BTreeMap;
    use std::sync::Arc;

    fn store() -> DeadLetterStore {
        DeadLetterStore::new(Arc::new(Database::open_in_memory().unwrap()))
    }

    fn letter(retry_count: u32) -> DeadLetter {
        let task = TaskEnvelope::new(
            "gw",
            Some("agent-1".to_string()),
            Priority::High,
            TaskType::ToolCall,
            BTreeMap::new(),
        );
        DeadLetter::new(task, "timeout", retry_count, cognis_types::ids::epoch_seconds())
    }

    #[test]
    fn retry_eligible_skips_entries_past_the_ceiling() {
        let store = store();
        let under_ceiling = letter(1);
        let over_ceiling = letter(5);
        store.send_to_dead_letter(&under_ceiling).unwrap();
        store.send_to_dead_letter(&over_ceiling).unwrap();

        let retried = retry_eligible(&store, 3).unwrap();
        assert_eq!(retried, vec![under_ceiling.id]);
        assert!(store.find(&over_ceiling.id).unwrap().is_some());
        assert!(store.find(&under_ceiling.id).unwrap().is_none());
    }

    #[test]
    fn exhausted_lists_only_entries_at_or_past_the_ceiling() {
        let store = store();
        let under = letter(0);
        let at_ceiling = letter(3);
        store.send_to_dead_letter(&under).unwrap();
        store.send_to_dead_letter(&at_ceiling).unwrap();

        let list = exhausted(&store, 3).unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].id, at_ceiling.id);
    }
}
