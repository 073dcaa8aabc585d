//! Thread-based concurrent workers: the priority broker (C2), the
//! heartbeat sender/reader and DLQ retry sweep (C3), and the streaming
//! orchestrator with its SSE delta bridge (C5).

mod broker;
mod config;
mod dlq;
mod error;
mod heartbeat;
mod orchestrator;
mod sse_bridge;

pub use broker::PriorityBroker;
pub use config::Config;
pub use dlq::{exhausted, retry_eligible};
pub use error::{Error, Result};
pub use heartbeat::{most_recent_heartbeat, HeartbeatSender};
pub use orchestrator::{should_skip_for_tts, Orchestrator, ResponseChunk, SynthesizedAudio, TtsProvider};
pub use sse_bridge::{DeltaTracker, TextDelta};
