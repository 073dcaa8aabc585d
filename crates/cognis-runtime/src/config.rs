//! Tunable thresholds for the broker, heartbeat loop, and streaming
//! orchestrator. Every field defaults to a sensible numeric constant
//! inline.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Sleep between broker poll ticks when no stream had traffic.
    pub broker_idle_sleep_ms: u64,
    /// Per-agent task channel buffer.
    pub agent_channel_buffer: usize,

    /// Interval between heartbeat sends.
    pub heartbeat_interval_ms: u64,
    /// Reverse-scan depth for `most_recent_heartbeat`.
    pub heartbeat_lookback: u32,

    /// Sentence buffer force-flush length.
    pub max_buffer_size: usize,
    /// Minimum buffer length the timeout monitor will flush.
    pub min_chunk_size: usize,
    /// Comma breakpoints only count past this span length.
    pub comma_break_length: usize,
    /// Timeout-monitor tick interval.
    pub timeout_monitor_tick_ms: u64,
    /// Time since the last chunk before the timeout monitor flushes.
    pub flush_timeout_ms: u64,
    /// Spoken-sentence channel buffer.
    pub speech_channel_buffer: usize,
    /// Sentences longer than this are skipped for TTS.
    pub max_tts_sentence_len: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            broker_idle_sleep_ms: 50,
            agent_channel_buffer: 100,
            heartbeat_interval_ms: 5_000,
            heartbeat_lookback: 10,
            max_buffer_size: 200,
            min_chunk_size: 20,
            comma_break_length: 40,
            timeout_monitor_tick_ms: 100,
            flush_timeout_ms: 500,
            speech_channel_buffer: 10,
            max_tts_sentence_len: 500,
        }
    }
}
