//! Tail a Particle event stream
//!
//! Subscribes with the configuration from flags / environment, logs every
//! event, and prints a summary of the cache each time it changes.
//!
//! Run with: `cargo run -p particle-events --example tail -- --mine --prefix temp`

use clap::Parser;
use particle_events::{EventRuntime, LoggingCallbacks, SubscriptionConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let config = SubscriptionConfig::parse();

    tracing::info!(
        url = %config.events_url(),
        scope = ?config.scope(),
        cache_capacity = config.cache_capacity,
        max_reconnects = ?config.max_reconnects,
        "Starting event subscription"
    );

    let runtime = EventRuntime::new(config, LoggingCallbacks);

    let cache = runtime.cache().clone();
    let mut changes = cache.subscribe();
    tokio::spawn(async move {
        while changes.changed().await.is_ok() {
            let groups = cache.snapshot();
            let summary: Vec<String> = groups
                .iter()
                .map(|(name, records)| format!("{}={}", name, records.len()))
                .collect();
            tracing::info!(
                capacity = cache.capacity(),
                groups = %summary.join(","),
                "Cache updated"
            );
        }
    });

    tokio::select! {
        result = runtime.run() => result?,
        _ = tokio::signal::ctrl_c() => tracing::info!("Interrupted, stopping"),
    }

    Ok(())
}
