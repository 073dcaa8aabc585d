//! A2A transport (C4): agent-card discovery, unary `message/send`,
//! SSE-streamed `message/stream`, and the server-side counterpart the
//! brain exposes to the avatar client and other agent workers.

mod client;
mod error;
mod jsonrpc;
mod server;
mod sse;

pub use client::{A2aClient, SendOptions, StatusHandler, DEFAULT_UNARY_TIMEOUT};
pub use error::{Error, Result};
pub use jsonrpc::{Configuration, MessageSendParams, RpcError, RpcRequest, RpcResponse, SendResult, StatusWrapper};
pub use server::{router, MessageHandler, TaskEventStream};
pub use sse::{SseEvent, SseParser};
