//! Priority Broker (C2): fan-in of the four priority streams into a
//! strictly-ordered per-agent delivery channel.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{sync_channel, Receiver, SyncSender};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use cognis_index::{LogClient, Subscription};
use cognis_types::{priority_stream_name, Priority, TaskEnvelope, AGENTS_CONSUMER_GROUP};

use crate::Config;

type AgentChannels = Arc<Mutex<HashMap<String, SyncSender<TaskEnvelope>>>>;

/// Runs the broker's poll loop on a dedicated thread until dropped or
/// `stop` is called.
pub struct PriorityBroker {
    cancel: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
    agents: AgentChannels,
    buffer: usize,
}

impl PriorityBroker {
    /// Subscribe to all four priority streams under one consumer name and
    /// spawn the poll loop.
    pub fn start(log: LogClient, config: Config, consumer: &str) -> crate::Result<Self> {
        let subscriptions: Vec<Subscription> = Priority::ALL_HIGH_TO_LOW
            .iter()
            .map(|priority| log.subscribe(&priority_stream_name(*priority), AGENTS_CONSUMER_GROUP, consumer))
            .collect::<cognis_index::Result<_>>()?;

        let cancel = Arc::new(AtomicBool::new(false));
        let agents: AgentChannels = Arc::new(Mutex::new(HashMap::new()));
        let idle_sleep = Duration::from_millis(config.broker_idle_sleep_ms);

        let loop_cancel = cancel.clone();
        let loop_agents = agents.clone();
        let handle = std::thread::Builder::new()
            .name("priority-broker".to_string())
            .spawn(move || run(subscriptions, loop_agents, loop_cancel, idle_sleep))
            .expect("spawning the priority broker thread");

        Ok(Self {
            cancel,
            handle: Some(handle),
            agents,
            buffer: config.agent_channel_buffer,
        })
    }

    /// Register `agent` for delivery, returning the receiving half of its
    /// task channel (buffer default 100).
    pub fn register_agent(&self, agent: &str) -> Receiver<TaskEnvelope> {
        let (tx, rx) = sync_channel(self.buffer);
        self.agents.lock().expect("agent registry mutex poisoned").insert(agent.to_string(), tx);
        rx
    }

    pub fn unregister_agent(&self, agent: &str) {
        self.agents.lock().expect("agent registry mutex poisoned").remove(agent);
    }

    /// Signal the poll loop to stop and join its thread.
    pub fn stop(mut self) {
        self.cancel.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for PriorityBroker {
    fn drop(&mut self) {
        self.cancel.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn run(subscriptions: Vec<Subscription>, agents: AgentChannels, cancel: Arc<AtomicBool>, idle_sleep: Duration) {
    while !cancel.load(Ordering::Relaxed) {
        let mut delivered = false;

        for sub in &subscriptions {
            let record = match sub.try_poll() {
                Ok(Some(record)) => record,
                Ok(None) => continue,
                Err(err) => {
                    tracing::error!(error = %err, stream = sub.stream(), "broker poll failed, skipping this tick");
                    continue;
                }
            };
            delivered = true;
            let (offset, bytes) = record;
            dispatch(&agents, &bytes);
            if let Err(err) = sub.ack(offset) {
                tracing::error!(error = %err, offset, "failed to ack delivered task");
            }
            // Strictly-ordered priority: once we've taken one message
            // from a stream, restart the scan from the top so a higher
            // priority stream that received traffic mid-tick wins next.
            break;
        }

        if !delivered {
            std::thread::sleep(idle_sleep);
        }
    }
}

fn dispatch(agents: &AgentChannels, bytes: &[u8]) {
    let task: TaskEnvelope = match serde_json::from_slice(bytes) {
        Ok(task) => task,
        Err(err) => {
            tracing::error!(error = %err, "dropping a task that failed to deserialize");
            return;
        }
    };

    // Tasks with an explicit `to` that doesn't match any registered agent
    // are skipped — this group already acked it, so filtering is this
    // consumer's responsibility.
    let agents = agents.lock().expect("agent registry mutex poisoned");
    let Some(to) = &task.to else {
        tracing::warn!(task_id = %task.id, "task has no destination agent, dropping");
        return;
    };
    match agents.get(to) {
        Some(sender) => {
            if sender.try_send(task.clone()).is_err() {
                tracing::warn!(task_id = %task.id, agent = %to, "agent task channel full or closed, dropping task");
            }
        }
        None => {
            tracing::debug!(task_id = %task.id, agent = %to, "task targets an unregistered agent, skipping");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cognis_index::Database;
    use cognis_types::TaskType;
    use std::collections::BTreeMap;
    use std::time::Instant;

    fn log() -> LogClient {
        LogClient::new(Arc::new(Database::open_in_memory().unwrap()))
    }

    fn recv_with_timeout(rx: &Receiver<TaskEnvelope>, timeout: Duration) -> Option<TaskEnvelope> {
        rx.recv_timeout(timeout).ok()
    }

    #[test]
    fn delivers_a_task_addressed_to_a_registered_agent() {
        let log = log();
        let broker = PriorityBroker::start(log.clone(), Config::default(), "broker-1").unwrap();
        let rx = broker.register_agent("agent-1");

        let task = TaskEnvelope::new(
            "gateway",
            Some("agent-1".to_string()),
            Priority::High,
            TaskType::ToolCall,
            BTreeMap::new(),
        );
        let bytes = serde_json::to_vec(&task).unwrap();
        log.append(&priority_stream_name(Priority::High), &bytes).unwrap();

        let delivered = recv_with_timeout(&rx, Duration::from_secs(2)).expect("task delivered");
        assert_eq!(delivered.id, task.id);
        broker.stop();
    }

    #[test]
    fn critical_priority_is_served_before_low_within_the_same_tick() {
        let log = log();
        let broker = PriorityBroker::start(log.clone(), Config::default(), "broker-2").unwrap();
        let rx = broker.register_agent("agent-1");

        let low = TaskEnvelope::new("gw", Some("agent-1".to_string()), Priority::Low, TaskType::ToolCall, BTreeMap::new());
        let critical = TaskEnvelope::new(
            "gw",
            Some("agent-1".to_string()),
            Priority::Critical,
            TaskType::ToolCall,
            BTreeMap::new(),
        );
        log.append(&priority_stream_name(Priority::Low), &serde_json::to_vec(&low).unwrap()).unwrap();
        log.append(&priority_stream_name(Priority::Critical), &serde_json::to_vec(&critical).unwrap()).unwrap();

        let first = recv_with_timeout(&rx, Duration::from_secs(2)).expect("first delivery");
        assert_eq!(first.id, critical.id);
        let second = recv_with_timeout(&rx, Duration::from_secs(2)).expect("second delivery");
        assert_eq!(second.id, low.id);
        broker.stop();
    }

    #[test]
    fn tasks_for_unregistered_agents_are_silently_skipped() {
        let log = log();
        let broker = PriorityBroker::start(log.clone(), Config::default(), "broker-3").unwrap();
        let _rx = broker.register_agent("agent-1");

        let task = TaskEnvelope::new(
            "gw",
            Some("agent-2".to_string()),
            Priority::Normal,
            TaskType::ToolCall,
            BTreeMap::new(),
        );
        log.append(&priority_stream_name(Priority::Normal), &serde_json::to_vec(&task).unwrap()).unwrap();

        let start = Instant::now();
        std::thread::sleep(Duration::from_millis(200));
        assert!(start.elapsed() < Duration::from_secs(2));
        broker.stop();
    }
}
