//! Particle event ingestion
//!
//! Subscribes to a Particle Device Cloud event stream, turns each
//! Server-Sent Events frame into an [`EventRecord`], and keeps the most
//! recent records in a [`BoundedEventCache`].
//!
//! # Overview
//!
//! - [`frame::parse_frame`] decodes one frame (`event:` + `data:` JSON) into a
//!   record; anything malformed or a keep-alive yields nothing
//! - [`BoundedEventCache`] holds a content-deduplicated set of records with a
//!   capacity bound and a caller-controlled eviction veto
//! - [`SubscriptionSession`] owns the HTTP stream and reports connection
//!   lifecycle and records as [`SessionEvent`]s
//! - [`EventRuntime`] ties a session to a cache and to [`EventCallbacks`]
//!
//! # Example
//!
//! ```no_run
//! use particle_events::{EventRuntime, LoggingCallbacks, SubscriptionConfig};
//! use clap::Parser;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = SubscriptionConfig::parse();
//!     let runtime = EventRuntime::new(config, LoggingCallbacks);
//!     runtime.cache().set_eviction_veto(|record| record.name() != "alarm");
//!     runtime.run().await?;
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod frame;
pub mod record;
pub mod runtime;
pub mod subscription;

// Re-export main types
pub use cache::{BoundedEventCache, EvictionVeto};
pub use config::SubscriptionConfig;
pub use error::{EventsError, StreamError};
pub use frame::parse_frame;
pub use record::EventRecord;
pub use runtime::{EventCallbacks, EventRuntime, LoggingCallbacks};
pub use subscription::{SessionEvent, SubscriptionHandle, SubscriptionScope, SubscriptionSession};
