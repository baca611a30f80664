//! Frame parser
//!
//! Turns the text of one stream message into an [`EventRecord`]:
//!
//! ```text
//! event: <name>
//! data: {"data": "...", "published_at": "...", "coreid": "...", "ttl": 60}
//! ```
//!
//! Everything after the `data:` marker is taken as the JSON payload,
//! embedded line breaks included. A blank line inside the frame does not end
//! the payload.
//!
//! Parsing never fails loudly: empty input, the `:ok` keep-alive, missing
//! markers and payloads that do not decode all produce `None`.

use serde::Deserialize;

use crate::record::EventRecord;

/// Event name the server uses for connection-health checks
pub const KEEPALIVE_EVENT: &str = ":ok";

const EVENT_MARKER: &str = "event:";
const DATA_MARKER: &str = "data:";

/// JSON payload carried on the `data:` line
#[derive(Debug, Deserialize)]
struct WirePayload {
    data: String,
    published_at: String,
    coreid: String,
    ttl: i64,
}

/// Parse one complete frame into a record
pub fn parse_frame(frame: &str) -> Option<EventRecord> {
    if frame.is_empty() {
        return None;
    }

    let mut rest = frame;
    let mut name = "";

    if let Some(after) = rest.strip_prefix(EVENT_MARKER) {
        let (line, tail) = after.split_once('\n').unwrap_or((after, ""));
        name = line.trim();
        if name == KEEPALIVE_EVENT {
            return None;
        }
        rest = tail;
    }

    let payload = rest
        .trim_start_matches(['\r', '\n'])
        .strip_prefix(DATA_MARKER)?;

    let wire: WirePayload = serde_json::from_str(payload).ok()?;

    Some(EventRecord::new(
        name,
        wire.data,
        wire.published_at,
        wire.coreid,
        wire.ttl,
    ))
}
