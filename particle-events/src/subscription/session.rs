//! Event stream session with caller-controlled reconnection
//!
//! Opens the configured event stream and keeps it open, reconnecting with
//! exponential backoff until the caller's reconnect budget
//! (`max_reconnects`) runs out or a fatal error occurs. Backoff restarts
//! from the initial delay after every successful connection; the budget
//! counts every disconnect over the session's lifetime.

use std::time::Duration;

use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::config::SubscriptionConfig;
use crate::error::StreamError;
use crate::frame::parse_frame;
use crate::subscription::reconnect::ReconnectPolicy;
use crate::subscription::events::SessionEvent;
use particle_sse::FrameSplitter;

/// Capacity of the channel between the session task and its consumer
const EVENT_CHANNEL_CAPACITY: usize = 1000;

/// Session that handles connection, reconnect, and frame parsing
pub struct SubscriptionSession {
    config: SubscriptionConfig,
    http_client: reqwest::Client,
}

/// A running session
///
/// Dropping the handle (or calling [`cancel`](Self::cancel)) stops the
/// underlying stream.
#[derive(Debug)]
pub struct SubscriptionHandle {
    events: mpsc::Receiver<SessionEvent>,
    task: JoinHandle<()>,
}

impl SubscriptionHandle {
    /// Next session event, or `None` once the session has stopped
    pub async fn recv(&mut self) -> Option<SessionEvent> {
        self.events.recv().await
    }

    /// Stop the session. Events already queued can still be received.
    pub fn cancel(&self) {
        self.task.abort();
    }

    /// Whether the session task has stopped
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl SubscriptionSession {
    /// Create a new session with the given configuration
    pub fn new(config: SubscriptionConfig) -> Result<Self, StreamError> {
        let http_client = reqwest::Client::builder()
            // No overall timeout: the event stream is a long-lived response
            .connect_timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            config,
            http_client,
        })
    }

    /// Start the session, returning a handle to its events
    ///
    /// This spawns a background task that:
    /// 1. Connects to the event stream
    /// 2. Parses frames and sends records to the channel
    /// 3. Reconnects on disconnect with exponential backoff, within the
    ///    configured reconnect budget
    pub fn start(self) -> SubscriptionHandle {
        let (tx, events) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

        let task = tokio::spawn(async move {
            self.run_loop(tx).await;
        });

        SubscriptionHandle { events, task }
    }

    async fn run_loop(self, tx: mpsc::Sender<SessionEvent>) {
        let mut reconnect = ReconnectPolicy::from_config(&self.config);

        loop {
            let result = match self.open().await {
                Ok(response) => {
                    reconnect.connected();
                    tracing::debug!("Event stream open");
                    if tx.send(SessionEvent::Connected).await.is_err() {
                        return;
                    }
                    self.pump(response, &tx).await
                }
                Err(e) => Err(e),
            };

            let error = match result {
                Ok(()) => {
                    // Receiver dropped
                    tracing::info!("Event stream consumer went away, stopping");
                    return;
                }
                Err(e) => e,
            };

            if error.is_fatal() {
                tracing::error!(error = %error, "Fatal event stream error, will not retry");
                let _ = tx.send(SessionEvent::Fatal(error)).await;
                return;
            }

            let _ = tx
                .send(SessionEvent::Disconnected {
                    reason: error.to_string(),
                })
                .await;

            let Some(delay) = reconnect.disconnected() else {
                let disconnects = reconnect.disconnects();
                tracing::error!(disconnects, "Reconnect budget exhausted");
                let _ = tx
                    .send(SessionEvent::Fatal(StreamError::RetriesExhausted {
                        disconnects,
                    }))
                    .await;
                return;
            };

            tracing::warn!(
                error = %error,
                reconnect_in_ms = delay.as_millis() as u64,
                "Event stream connection lost, will reconnect"
            );
            tokio::time::sleep(delay).await;
        }
    }

    /// Open the event stream
    async fn open(&self) -> Result<reqwest::Response, StreamError> {
        let url = self.config.events_url();

        tracing::info!(url = %url, "Connecting to event stream");

        let mut request = self
            .http_client
            .get(&url)
            .header("Accept", "text/event-stream");

        if let Some(token) = self.config.load_token().map_err(StreamError::TokenLoad)? {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            return Err(StreamError::HttpStatus(response.status()));
        }

        Ok(response)
    }

    /// Forward records from an open stream
    ///
    /// Returns `Ok(())` only when the receiver has been dropped. A stream
    /// that ends is reported as [`StreamError::Closed`].
    async fn pump(
        &self,
        response: reqwest::Response,
        tx: &mpsc::Sender<SessionEvent>,
    ) -> Result<(), StreamError> {
        let mut stream = response.bytes_stream();
        let mut splitter = FrameSplitter::new();

        while let Some(chunk_result) = stream.next().await {
            let bytes = chunk_result?;

            for frame in splitter.feed(&bytes) {
                if !deliver(&frame, tx).await {
                    return Ok(());
                }
            }
        }

        if let Some(frame) = splitter.finish() {
            if !deliver(&frame, tx).await {
                return Ok(());
            }
        }

        Err(StreamError::Closed)
    }
}

/// Parse a frame and send the record, if any.
/// Returns false when the receiver is gone.
async fn deliver(frame: &str, tx: &mpsc::Sender<SessionEvent>) -> bool {
    match parse_frame(frame) {
        Some(record) => tx.send(SessionEvent::Record(record)).await.is_ok(),
        None => {
            tracing::debug!(len = frame.len(), "Dropped frame without a record");
            true
        }
    }
}
