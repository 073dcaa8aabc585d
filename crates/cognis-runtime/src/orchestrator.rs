//! Streaming Orchestrator (C5): sentence extraction off a
//! chunk stream, timeout-driven force flush, and TTS fanout.
//!
//! Three threads, matching the "one goroutine per role" contract
//! literally: one receives chunks and extracts sentences, one drives a
//! 100ms timeout-monitor tick, one speaks sentences off a bounded
//! internal channel. The chunk channel closing is what ends the
//! pipeline: the receiver thread exits when it reads `is_final` or the
//! channel disconnects, the timeout monitor exits once told the receiver
//! is done, and the speaker exits once both have dropped their senders —
//! sender-before-speaker, so nothing writes to a channel after its last
//! reader gave up.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{sync_channel, Receiver, SyncSender};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crate::Config;

/// A fragment of a model response.
#[derive(Debug, Clone)]
pub struct ResponseChunk {
    pub text: String,
    pub is_final: bool,
}

#[derive(Debug, Clone)]
pub struct SynthesizedAudio {
    pub audio: Vec<u8>,
    pub format: String,
    pub phonemes: Vec<String>,
}

pub trait TtsProvider: Send + Sync {
    fn synthesize(&self, sentence: &str) -> Result<SynthesizedAudio, String>;
}

struct BufferState {
    text: String,
    last_chunk_at: Instant,
}

pub struct Orchestrator {
    cancel: Arc<AtomicBool>,
    threads: Vec<JoinHandle<()>>,
}

impl Orchestrator {
    /// Spawn the three worker threads. `on_speak` is called for every
    /// sentence that clears `should_skip_for_tts` and synthesizes
    /// successfully; `on_start`/`on_stop` bracket the first/last spoken
    /// sentence, `on_stop` firing only if `on_start` ever did.
    pub fn start(
        chunks: Receiver<ResponseChunk>,
        tts: Arc<dyn TtsProvider>,
        config: Config,
        on_speak: impl Fn(SynthesizedAudio) + Send + 'static,
        on_start: impl FnOnce() + Send + 'static,
        on_stop: impl FnOnce() + Send + 'static,
    ) -> Self {
        let cancel = Arc::new(AtomicBool::new(false));
        let receiver_done = Arc::new(AtomicBool::new(false));
        let buffer = Arc::new(Mutex::new(BufferState {
            text: String::new(),
            last_chunk_at: Instant::now(),
        }));
        let (speak_tx, speak_rx) = sync_channel::<String>(config.speech_channel_buffer);

        let mut threads = Vec::with_capacity(3);

        threads.push({
            let cancel = cancel.clone();
            let receiver_done = receiver_done.clone();
            let buffer = buffer.clone();
            let config = config.clone();
            let speak_tx = speak_tx.clone();
            std::thread::Builder::new()
                .name("orchestrator-receiver".to_string())
                .spawn(move || run_receiver(chunks, buffer, config, speak_tx, cancel, receiver_done))
                .expect("spawning the orchestrator receiver thread")
        });

        threads.push({
            let cancel = cancel.clone();
            let receiver_done = receiver_done.clone();
            let buffer = buffer.clone();
            let config = config.clone();
            let speak_tx = speak_tx.clone();
            std::thread::Builder::new()
                .name("orchestrator-timeout-monitor".to_string())
                .spawn(move || run_timeout_monitor(buffer, config, speak_tx, cancel, receiver_done))
                .expect("spawning the orchestrator timeout-monitor thread")
        });

        // Drop the top-level clone so the channel closes once both
        // workers above have dropped theirs.
        drop(speak_tx);

        threads.push({
            std::thread::Builder::new()
                .name("orchestrator-speaker".to_string())
                .spawn(move || run_speaker(speak_rx, tts, config, on_speak, on_start, on_stop))
                .expect("spawning the orchestrator speaker thread")
        });

        Self { cancel, threads }
    }

    /// Signal cancellation and wait for all three threads to exit.
    pub fn stop(mut self) {
        self.cancel.store(true, Ordering::Relaxed);
        for handle in self.threads.drain(..) {
            let _ = handle.join();
        }
    }
}

impl Drop for Orchestrator {
    fn drop(&mut self) {
        self.cancel.store(true, Ordering::Relaxed);
        for handle in self.threads.drain(..) {
            let _ = handle.join();
        }
    }
}

fn run_receiver(
    chunks: Receiver<ResponseChunk>,
    buffer: Arc<Mutex<BufferState>>,
    config: Config,
    speak_tx: SyncSender<String>,
    cancel: Arc<AtomicBool>,
    receiver_done: Arc<AtomicBool>,
) {
    loop {
        if cancel.load(Ordering::Relaxed) {
            break;
        }
        match chunks.recv_timeout(Duration::from_millis(100)) {
            Ok(chunk) => {
                let sentences = {
                    let mut state = buffer.lock().expect("orchestrator buffer mutex poisoned");
                    state.text.push_str(&chunk.text);
                    state.last_chunk_at = Instant::now();
                    extract_sentences(&mut state.text, &config, chunk.is_final)
                };
                for sentence in sentences {
                    if speak_tx.send(sentence).is_err() {
                        break;
                    }
                }
                if chunk.is_final {
                    break;
                }
            }
            Err(std::sync::mpsc::RecvTimeoutError::Timeout) => continue,
            Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }
    receiver_done.store(true, Ordering::Relaxed);
}

fn run_timeout_monitor(
    buffer: Arc<Mutex<BufferState>>,
    config: Config,
    speak_tx: SyncSender<String>,
    cancel: Arc<AtomicBool>,
    receiver_done: Arc<AtomicBool>,
) {
    let tick = Duration::from_millis(config.timeout_monitor_tick_ms);
    let flush_timeout = Duration::from_millis(config.flush_timeout_ms);
    loop {
        std::thread::sleep(tick);
        let done = receiver_done.load(Ordering::Relaxed);
        if cancel.load(Ordering::Relaxed) {
            break;
        }

        let flushed = {
            let mut state = buffer.lock().expect("orchestrator buffer mutex poisoned");
            if state.text.len() >= config.min_chunk_size && state.last_chunk_at.elapsed() >= flush_timeout {
                let sentence = state.text.trim().to_string();
                state.text.clear();
                if sentence.is_empty() {
                    None
                } else {
                    Some(sentence)
                }
            } else {
                None
            }
        };
        if let Some(sentence) = flushed {
            let _ = speak_tx.send(sentence);
        }

        if done {
            break;
        }
    }
}

fn run_speaker(
    speak_rx: Receiver<String>,
    tts: Arc<dyn TtsProvider>,
    config: Config,
    on_speak: impl Fn(SynthesizedAudio),
    on_start: impl FnOnce(),
    on_stop: impl FnOnce(),
) {
    let mut started = false;
    let mut on_start = Some(on_start);

    while let Ok(sentence) = speak_rx.recv() {
        if should_skip_for_tts(&sentence, config.max_tts_sentence_len) {
            continue;
        }
        match tts.synthesize(&sentence) {
            Ok(audio) => {
                if !started {
                    started = true;
                    if let Some(start) = on_start.take() {
                        start();
                    }
                }
                on_speak(audio);
            }
            Err(err) => tracing::warn!(error = %err, "tts synthesis failed, skipping sentence"),
        }
    }

    if started {
        on_stop();
    }
}

/// Pull complete sentences off the front of `buffer`, leaving any
/// trailing partial text in place. When `at_end_of_stream` is set,
/// whatever remains after boundary extraction is flushed as a final
/// sentence too.
fn extract_sentences(buffer: &mut String, config: &Config, at_end_of_stream: bool) -> Vec<String> {
    let mut sentences = Vec::new();

    loop {
        if let Some(split_at) = find_boundary(buffer, config.comma_break_length) {
            let sentence = buffer[..split_at].trim().to_string();
            let rest = buffer[split_at..].trim_start().to_string();
            *buffer = rest;
            if !sentence.is_empty() {
                sentences.push(sentence);
            }
            continue;
        }

        if buffer.len() >= config.max_buffer_size {
            let sentence = buffer.trim().to_string();
            buffer.clear();
            if !sentence.is_empty() {
                sentences.push(sentence);
            }
            continue;
        }

        break;
    }

    if at_end_of_stream {
        let sentence = buffer.trim().to_string();
        buffer.clear();
        if !sentence.is_empty() {
            sentences.push(sentence);
        }
    }

    sentences
}

/// The byte offset right after a sentence-ending boundary: a
/// `.`/`!`/`?`/`\n` followed by whitespace and then an uppercase letter,
/// or a comma once the span so far is at least `comma_break_length`.
fn find_boundary(text: &str, comma_break_length: usize) -> Option<usize> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    for i in 0..chars.len() {
        let (byte_idx, ch) = chars[i];
        match ch {
            '.' | '!' | '?' | '\n' => {
                let Some(&(_, next)) = chars.get(i + 1) else { continue };
                if !next.is_whitespace() {
                    continue;
                }
                let Some(&(_, after)) = chars.get(i + 2) else { continue };
                if after.is_uppercase() {
                    return Some(byte_idx + ch.len_utf8() + next.len_utf8());
                }
            }
            ',' if byte_idx >= comma_break_length => {
                return Some(byte_idx + ch.len_utf8());
            }
            _ => {}
        }
    }
    None
}

/// Sentences dropped from TTS fanout entirely: headings
/// and list markers, fenced code, chain-of-thought markers, and anything
/// implausibly long for a single utterance.
pub fn should_skip_for_tts(sentence: &str, max_len: usize) -> bool {
    let trimmed = sentence.trim_start();
    trimmed.starts_with('#')
        || trimmed.starts_with('-')
        || trimmed.starts_with('*')
        || sentence.contains("```")
        || sentence.contains("<thinking>")
        || sentence.contains("</thinking>")
        || sentence.len() > max_len
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    #[test]
    fn extracts_a_complete_sentence_and_keeps_the_trailing_partial() {
        let mut buf = "Hello world. Next sentence starts".to_string();
        let config = Config::default();
        let sentences = extract_sentences(&mut buf, &config, false);
        assert_eq!(sentences, vec!["Hello world.".to_string()]);
        assert_eq!(buf, "Next sentence starts");
    }

    #[test]
    fn comma_breaks_only_past_the_configured_span() {
        let mut buf = "short, one".to_string();
        let config = Config::default();
        assert!(extract_sentences(&mut buf, &config, false).is_empty());

        let mut long_buf = "this clause runs long enough to pass the comma threshold, then continues".to_string();
        let sentences = extract_sentences(&mut long_buf, &config, false);
        assert_eq!(sentences.len(), 1);
        assert!(sentences[0].ends_with(','));
    }

    #[test]
    fn force_flushes_at_max_buffer_size() {
        let mut config = Config::default();
        config.max_buffer_size = 10;
        let mut buf = "no punctuation here at all".to_string();
        let sentences = extract_sentences(&mut buf, &config, false);
        assert_eq!(sentences, vec!["no punctuation here at all".to_string()]);
        assert!(buf.is_empty());
    }

    #[test]
    fn end_of_stream_flushes_any_remainder() {
        let mut buf = "trailing fragment".to_string();
        let config = Config::default();
        let sentences = extract_sentences(&mut buf, &config, true);
        assert_eq!(sentences, vec!["trailing fragment".to_string()]);
    }

    #[test]
    fn should_skip_for_tts_flags_headings_code_and_thinking_markers() {
        assert!(should_skip_for_tts("# a heading", 500));
        assert!(should_skip_for_tts("- a list item", 500));
        assert!(should_skip_for_tts("* another list item", 500));
        assert!(should_skip_for_tts("```rust\nfn main() {}\n```", 500));
        assert!(should_skip_for_tts("<thinking>hmm</thinking>", 500));
        assert!(should_skip_for_tts(&"x".repeat(501), 500));
        assert!(!should_skip_for_tts("A normal sentence.", 500));
    }

    struct EchoTts;
    impl TtsProvider for EchoTts {
        fn synthesize(&self, sentence: &str) -> Result<SynthesizedAudio, String> {
            Ok(SynthesizedAudio {
                audio: sentence.as_bytes().to_vec(),
                format: "pcm".to_string(),
                phonemes: vec![],
            })
        }
    }

    #[test]
    fn end_to_end_pipeline_speaks_sentences_and_brackets_with_start_stop() {
        let (chunk_tx, chunk_rx) = std::sync::mpsc::channel();
        let spoken = Arc::new(StdMutex::new(Vec::new()));
        let started = Arc::new(AtomicBool::new(false));
        let stopped = Arc::new(AtomicBool::new(false));

        let spoken_for_cb = spoken.clone();
        let started_for_cb = started.clone();
        let stopped_for_cb = stopped.clone();

        let orchestrator = Orchestrator::start(
            chunk_rx,
            Arc::new(EchoTts),
            Config::default(),
            move |audio| spoken_for_cb.lock().unwrap().push(String::from_utf8(audio.audio).unwrap()),
            move || started_for_cb.store(true, Ordering::Relaxed),
            move || stopped_for_cb.store(true, Ordering::Relaxed),
        );

        chunk_tx
            .send(ResponseChunk {
                text: "Hello world. ".to_string(),
                is_final: false,
            })
            .unwrap();
        chunk_tx
            .send(ResponseChunk {
                text: "Goodbye now.".to_string(),
                is_final: true,
            })
            .unwrap();
        drop(chunk_tx);

        orchestrator.stop();

        assert!(started.load(Ordering::Relaxed));
        assert!(stopped.load(Ordering::Relaxed));
        let spoken = spoken.lock().unwrap();
        assert_eq!(spoken.as_slice(), &["Hello world.".to_string(), "Goodbye now.".to_string()]);
    }
}
