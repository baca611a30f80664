//! Events reported by a subscription session

use crate::error::StreamError;
use crate::record::EventRecord;

/// Lifecycle and data events emitted by [`SubscriptionSession`](super::SubscriptionSession)
#[derive(Debug)]
pub enum SessionEvent {
    /// The stream is open
    Connected,
    /// A frame decoded into a record
    Record(EventRecord),
    /// Connection lost (will reconnect if the policy allows)
    Disconnected { reason: String },
    /// The session has stopped and will not reconnect
    Fatal(StreamError),
}
