//! Heartbeat sender and reader (C3).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use cognis_index::LogClient;
use cognis_types::{heartbeat_stream_name, AgentStatus, Heartbeat};

use crate::Config;

/// Background loop emitting this agent's heartbeat at a fixed interval.
/// The first heartbeat fires immediately; a send failure is logged and
/// the loop continues (liveness itself is best-effort).
pub struct HeartbeatSender {
    cancel: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl HeartbeatSender {
    pub fn start(log: LogClient, agent: impl Into<String>, config: Config, status_fn: impl Fn() -> AgentStatus + Send + 'static) -> Self {
        let agent = agent.into();
        let cancel = Arc::new(AtomicBool::new(false));
        let loop_cancel = cancel.clone();
        let interval = Duration::from_millis(config.heartbeat_interval_ms);

        let handle = std::thread::Builder::new()
            .name(format!("heartbeat-{agent}"))
            .spawn(move || {
                loop {
                    send_one(&log, &agent, status_fn());
                    if wait_or_cancel(&loop_cancel, interval) {
                        break;
                    }
                }
            })
            .expect("spawning the heartbeat sender thread");

        Self {
            cancel,
            handle: Some(handle),
        }
    }

    pub fn stop(mut self) {
        self.cancel.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for HeartbeatSender {
    fn drop(&mut self) {
        self.cancel.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn send_one(log: &LogClient, agent: &str, status: AgentStatus) {
    let heartbeat = Heartbeat::new(agent, status, cognis_types::ids::epoch_seconds());
    match serde_json::to_vec(&heartbeat) {
        Ok(bytes) => {
            if let Err(err) = log.append(heartbeat_stream_name(), &bytes) {
                tracing::warn!(error = %err, agent, "heartbeat send failed, continuing");
            }
        }
        Err(err) => tracing::warn!(error = %err, agent, "failed to encode heartbeat"),
    }
}

/// Sleep in short slices so cancellation is observed promptly rather than
/// only at the next full interval boundary. Returns `true` if cancelled.
fn wait_or_cancel(cancel: &AtomicBool, interval: Duration) -> bool {
    const SLICE: Duration = Duration::from_millis(50);
    let mut waited = Duration::ZERO;
    while waited < interval {
        if cancel.load(Ordering::Relaxed) {
            return true;
        }
        let slice = SLICE.min(interval - waited);
        std::thread::sleep(slice);
        waited += slice;
    }
    cancel.load(Ordering::Relaxed)
}

/// Reverse-scan the heartbeat stream for the most recent record belonging
/// to `agent`, stopping once `lookback` records have been examined.
pub fn most_recent_heartbeat(log: &LogClient, agent: &str, lookback: u32) -> crate::Result<Option<Heartbeat>> {
    let records = log.read_recent(heartbeat_stream_name(), lookback)?;
    for (_, bytes) in records {
        let heartbeat: Heartbeat = match serde_json::from_slice(&bytes) {
            Ok(h) => h,
            Err(err) => {
                tracing::warn!(error = %err, "skipping an unparseable heartbeat record");
                continue;
            }
        };
        if heartbeat.agent == agent {
            return Ok(Some(heartbeat));
        }
    }
    Ok(None)
}
