//! Reconnect scheduling for the event stream

use std::time::Duration;

use rand::Rng;

use crate::config::SubscriptionConfig;

/// Decides whether and when a lost stream is reopened
///
/// Delays double from the initial delay up to the maximum, with up to 25%
/// jitter on top. A successful connect restarts the doubling. The budget
/// counts every disconnect for the lifetime of the session and is never
/// refilled.
#[derive(Debug)]
pub(crate) struct ReconnectPolicy {
    initial_ms: u64,
    max_ms: u64,
    budget: Option<u32>,
    disconnects: u32,
    /// Disconnects since the last successful connect
    streak: u32,
}

impl ReconnectPolicy {
    pub(crate) fn new(initial_ms: u64, max_ms: u64, budget: Option<u32>) -> Self {
        Self {
            initial_ms,
            max_ms,
            budget,
            disconnects: 0,
            streak: 0,
        }
    }

    pub(crate) fn from_config(config: &SubscriptionConfig) -> Self {
        Self::new(
            config.reconnect_initial_ms,
            config.reconnect_max_ms,
            config.max_reconnects,
        )
    }

    /// The stream opened
    pub(crate) fn connected(&mut self) {
        self.streak = 0;
    }

    /// Count a disconnect. Returns how long to wait before reconnecting, or
    /// `None` once the budget is spent.
    pub(crate) fn disconnected(&mut self) -> Option<Duration> {
        self.disconnects = self.disconnects.saturating_add(1);
        if self.budget.is_some_and(|max| self.disconnects > max) {
            return None;
        }

        let factor = 1u64.checked_shl(self.streak).unwrap_or(u64::MAX);
        let capped = self.initial_ms.saturating_mul(factor).min(self.max_ms);
        let jitter = rand::thread_rng().gen_range(0..=capped / 4);
        self.streak = self.streak.saturating_add(1);

        Some(Duration::from_millis(capped + jitter))
    }

    /// Disconnects seen so far
    pub(crate) fn disconnects(&self) -> u32 {
        self.disconnects
    }
}
