//! Lightweight SSE (Server-Sent Events) framing
//!
//! Provides a streaming splitter for the SSE transport format. The splitter
//! accumulates bytes and yields complete frames: the raw text of one server
//! message, with the blank-line delimiter removed.
//!
//! Interpreting a frame (event name, payload decoding) is left to the caller.
//! This crate only depends on `tracing`, so it can be shared by anything that
//! needs to cut an SSE byte stream into messages.

mod splitter;

pub use splitter::FrameSplitter;
