//! Subscription configuration and validation
//!
//! Configuration for an event subscription: which stream to open, how to
//! authenticate it, how large the event cache starts, and reconnect behavior.

use clap::Parser;

use crate::subscription::SubscriptionScope;

/// Default Particle Device Cloud API base URL
pub const DEFAULT_API_URL: &str = "https://api.particle.io";

/// Default initial capacity of the event cache
pub const DEFAULT_CACHE_CAPACITY: usize = 100;

/// Configuration for an event subscription
#[derive(Parser, Debug, Clone)]
#[command(name = "particle-events", about = "Particle Device Cloud event subscription")]
pub struct SubscriptionConfig {
    // === Stream endpoint ===
    /// API base URL
    #[arg(long, env = "PARTICLE_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Access token sent as a Bearer token (or @filepath to read from file)
    #[arg(long, env = "PARTICLE_ACCESS_TOKEN")]
    pub access_token: Option<String>,

    /// Only receive events whose name starts with this prefix
    #[arg(long = "prefix")]
    pub event_prefix: Option<String>,

    /// Subscribe to a single device's events
    #[arg(long)]
    pub device: Option<String>,

    /// Subscribe to a product's events (id or slug)
    #[arg(long)]
    pub product: Option<String>,

    /// Subscribe to events from all of your devices instead of the public stream
    #[arg(long, default_value = "false")]
    pub mine: bool,

    // === Cache ===
    /// Initial event cache capacity
    #[arg(long, default_value_t = DEFAULT_CACHE_CAPACITY)]
    pub cache_capacity: usize,

    // === Reconnect behavior ===
    /// Initial reconnect delay (ms)
    #[arg(long, default_value = "1000")]
    pub reconnect_initial_ms: u64,

    /// Max reconnect delay (ms)
    #[arg(long, default_value = "30000")]
    pub reconnect_max_ms: u64,

    /// Stop after this many reconnects (unlimited if unset)
    #[arg(long)]
    pub max_reconnects: Option<u32>,
}

impl SubscriptionConfig {
    /// Validate the configuration at startup
    pub fn validate(&self) -> Result<(), String> {
        if self.device.is_some() && self.product.is_some() {
            return Err("--device and --product are mutually exclusive".to_string());
        }

        if let Some(prefix) = &self.event_prefix {
            if prefix.is_empty() {
                return Err("--prefix must not be empty".to_string());
            }
        }

        if !self.api_url.starts_with("http://") && !self.api_url.starts_with("https://") {
            return Err(format!("api_url must be an http(s) URL: {}", self.api_url));
        }

        // Validate reconnect parameters
        if self.reconnect_initial_ms == 0 {
            return Err("reconnect_initial_ms must be > 0".to_string());
        }
        if self.reconnect_max_ms < self.reconnect_initial_ms {
            return Err("reconnect_max_ms must be >= reconnect_initial_ms".to_string());
        }

        Ok(())
    }

    /// The stream this configuration subscribes to
    ///
    /// A device or product selects that stream; otherwise `--mine` selects
    /// the stream of the caller's own devices, and the public stream is the
    /// fallback.
    pub fn scope(&self) -> SubscriptionScope {
        match (&self.device, &self.product) {
            (Some(device), _) => SubscriptionScope::Device(device.clone()),
            (None, Some(product)) => SubscriptionScope::Product(product.clone()),
            (None, None) if self.mine => SubscriptionScope::Mine,
            (None, None) => SubscriptionScope::Public,
        }
    }

    /// Full URL of the event stream
    pub fn events_url(&self) -> String {
        let base = self.api_url.trim_end_matches('/');
        format!(
            "{}{}",
            base,
            self.scope().path(self.event_prefix.as_deref())
        )
    }

    /// Load the access token, resolving @filepath if needed
    pub fn load_token(&self) -> Result<Option<String>, std::io::Error> {
        match &self.access_token {
            Some(token) if token.starts_with('@') => {
                let path = shellexpand::tilde(&token[1..]);
                let content = std::fs::read_to_string(path.as_ref())?;
                Ok(Some(content.trim().to_string()))
            }
            Some(token) => Ok(Some(token.clone())),
            None => Ok(None),
        }
    }
}

impl Default for SubscriptionConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            access_token: None,
            event_prefix: None,
            device: None,
            product: None,
            mine: false,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            reconnect_initial_ms: 1000,
            reconnect_max_ms: 30000,
            max_reconnects: None,
        }
    }
}
