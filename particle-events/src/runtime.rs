//! Event runtime orchestration
//!
//! The EventRuntime ties together the subscription session, the event cache,
//! and callbacks. Records from the stream go into the cache through its
//! non-blocking insert path and are then handed to the callbacks.

use std::sync::Arc;

use async_trait::async_trait;

use crate::cache::BoundedEventCache;
use crate::config::SubscriptionConfig;
use crate::error::EventsError;
use crate::record::EventRecord;
use crate::subscription::{SessionEvent, SubscriptionSession};

/// Callback trait for subscription events
///
/// Implement this trait to be notified as the stream delivers data.
/// All methods have default no-op implementations.
#[async_trait]
pub trait EventCallbacks: Send + Sync {
    /// Called when the event stream is (re)opened
    async fn on_connected(&self) {}

    /// Called when the event stream is lost
    async fn on_disconnected(&self, _reason: &str) {}

    /// Called for every record, after it has been queued for the cache
    async fn on_event(&self, _record: &EventRecord) {}
}

/// Default logging-only callbacks
pub struct LoggingCallbacks;

#[async_trait]
impl EventCallbacks for LoggingCallbacks {
    async fn on_connected(&self) {
        tracing::info!("Connected to event stream");
    }

    async fn on_disconnected(&self, reason: &str) {
        tracing::warn!(reason, "Disconnected from event stream");
    }

    async fn on_event(&self, record: &EventRecord) {
        tracing::info!(
            name = record.name(),
            core_id = record.core_id(),
            published_at = record.published_at_raw(),
            value = record.value(),
            "Event received"
        );
    }
}

/// The event runtime orchestrates session + cache + callbacks
pub struct EventRuntime<C: EventCallbacks> {
    config: SubscriptionConfig,
    cache: BoundedEventCache,
    callbacks: Arc<C>,
}

impl<C: EventCallbacks + 'static> EventRuntime<C> {
    /// Create a new runtime with the given config and callbacks
    ///
    /// The cache starts at `config.cache_capacity`. Must be called from
    /// within a tokio runtime.
    pub fn new(config: SubscriptionConfig, callbacks: C) -> Self {
        let cache = BoundedEventCache::new(config.cache_capacity);
        Self::with_cache(config, cache, callbacks)
    }

    /// Create a runtime that feeds an existing cache
    pub fn with_cache(config: SubscriptionConfig, cache: BoundedEventCache, callbacks: C) -> Self {
        Self {
            config,
            cache,
            callbacks: Arc::new(callbacks),
        }
    }

    /// Get a handle to the cache
    pub fn cache(&self) -> &BoundedEventCache {
        &self.cache
    }

    /// Get a reference to the callbacks
    pub fn callbacks(&self) -> Arc<C> {
        self.callbacks.clone()
    }

    /// Run until the session stops
    ///
    /// Returns the fatal transport error that ended the session. Dropping
    /// the returned future cancels the stream.
    pub async fn run(&self) -> Result<(), EventsError> {
        self.config.validate().map_err(EventsError::Config)?;

        let session = SubscriptionSession::new(self.config.clone())?;
        let mut handle = session.start();

        while let Some(event) = handle.recv().await {
            self.handle_event(event).await?;
        }

        Ok(())
    }

    async fn handle_event(&self, event: SessionEvent) -> Result<(), EventsError> {
        match event {
            SessionEvent::Connected => {
                self.callbacks.on_connected().await;
            }

            SessionEvent::Record(record) => {
                self.cache.insert(record.clone());
                self.callbacks.on_event(&record).await;
            }

            SessionEvent::Disconnected { reason } => {
                self.callbacks.on_disconnected(&reason).await;
            }

            SessionEvent::Fatal(error) => {
                tracing::error!(error = %error, "Event stream stopped");
                return Err(error.into());
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StreamError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingCallbacks {
        connected: AtomicUsize,
        disconnected: AtomicUsize,
        events: AtomicUsize,
    }

    impl CountingCallbacks {
        fn new() -> Self {
            Self {
                connected: AtomicUsize::new(0),
                disconnected: AtomicUsize::new(0),
                events: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl EventCallbacks for CountingCallbacks {
        async fn on_connected(&self) {
            self.connected.fetch_add(1, Ordering::SeqCst);
        }

        async fn on_disconnected(&self, _reason: &str) {
            self.disconnected.fetch_add(1, Ordering::SeqCst);
        }

        async fn on_event(&self, _record: &EventRecord) {
            self.events.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn make_record(value: &str) -> EventRecord {
        EventRecord::new("temperature", value, "2015-07-18T00:12:18.174Z", "abc", 60)
    }

    #[tokio::test]
    async fn test_handle_event_connected() {
        let runtime = EventRuntime::new(SubscriptionConfig::default(), CountingCallbacks::new());

        runtime.handle_event(SessionEvent::Connected).await.unwrap();

        assert_eq!(runtime.callbacks.connected.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_handle_event_record_reaches_cache() {
        let runtime = EventRuntime::new(SubscriptionConfig::default(), CountingCallbacks::new());

        runtime
            .handle_event(SessionEvent::Record(make_record("25.34")))
            .await
            .unwrap();
        runtime
            .handle_event(SessionEvent::Record(make_record("25.34")))
            .await
            .unwrap();
        runtime.cache().flush().await;

        assert_eq!(runtime.callbacks.events.load(Ordering::SeqCst), 2);
        assert_eq!(runtime.cache().len(), 1);
    }

    #[tokio::test]
    async fn test_disconnect_keeps_cache() {
        let runtime = EventRuntime::new(SubscriptionConfig::default(), CountingCallbacks::new());

        runtime
            .handle_event(SessionEvent::Record(make_record("1")))
            .await
            .unwrap();
        runtime
            .handle_event(SessionEvent::Disconnected {
                reason: "reset".to_string(),
            })
            .await
            .unwrap();
        runtime.handle_event(SessionEvent::Connected).await.unwrap();
        runtime.cache().flush().await;

        assert_eq!(runtime.callbacks.disconnected.load(Ordering::SeqCst), 1);
        assert_eq!(runtime.cache().len(), 1);
    }

    #[tokio::test]
    async fn test_fatal_is_returned() {
        let runtime = EventRuntime::new(SubscriptionConfig::default(), CountingCallbacks::new());

        let err = runtime
            .handle_event(SessionEvent::Fatal(StreamError::RetriesExhausted { disconnects: 2 }))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            EventsError::Stream(StreamError::RetriesExhausted { disconnects: 2 })
        ));
    }

    #[tokio::test]
    async fn test_run_rejects_invalid_config() {
        let config = SubscriptionConfig {
            device: Some("abc".to_string()),
            product: Some("widgets".to_string()),
            ..Default::default()
        };
        let runtime = EventRuntime::new(config, CountingCallbacks::new());

        assert!(matches!(runtime.run().await, Err(EventsError::Config(_))));
    }

    #[tokio::test]
    async fn test_shared_cache() {
        let cache = BoundedEventCache::new(3);
        let runtime = EventRuntime::with_cache(
            SubscriptionConfig::default(),
            cache.clone(),
            CountingCallbacks::new(),
        );

        runtime
            .handle_event(SessionEvent::Record(make_record("1")))
            .await
            .unwrap();
        cache.flush().await;

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.capacity(), 3);
    }
}
