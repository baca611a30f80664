//! Event stream subscription
//!
//! This module owns the I/O side of ingestion: opening the event stream for
//! a [`SubscriptionScope`], cutting the byte stream into frames with
//! `particle_sse::FrameSplitter`, parsing frames into records, and reporting
//! everything as [`SessionEvent`]s.

mod reconnect;
pub mod events;
pub mod scope;
pub mod session;

pub use events::SessionEvent;
pub use scope::SubscriptionScope;
pub use session::{SubscriptionHandle, SubscriptionSession};
