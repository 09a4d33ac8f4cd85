use std::sync::Arc;

use chrono_tz::Tz;
use tracing::info;

use rendezvous::config::SchedulerConfig;
use rendezvous::engine::Engine;
use rendezvous::model::Session;
use rendezvous::store::{InMemoryStore, Snapshot};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    rendezvous::observability::init_logging();

    let config = SchedulerConfig::from_env()?;
    rendezvous::observability::init(config.metrics_port)?;

    let snapshot: Snapshot = match std::env::var("RENDEZVOUS_SEED") {
        Ok(path) => {
            let text = std::fs::read_to_string(&path)?;
            info!("seed: {path}");
            serde_json::from_str(&text)?
        }
        Err(_) => Snapshot::default(),
    };
    let user_name = std::env::var("RENDEZVOUS_USER").unwrap_or_else(|_| "admin".into());
    let viewer_zone: Tz = match std::env::var("RENDEZVOUS_VIEWER_ZONE") {
        Ok(name) => name
            .parse()
            .map_err(|_| format!("invalid value for RENDEZVOUS_VIEWER_ZONE: {name:?}"))?,
        Err(_) => config.business_zone,
    };

    let store = Arc::new(InMemoryStore::from_snapshot(snapshot));
    info!("  customers: {}", store.customer_count());
    info!("  appointments: {}", store.appointment_count());
    info!(
        "  business hours: {}-{} {}",
        config.business_start.format("%H:%M"),
        config.business_end.format("%H:%M"),
        config.business_zone
    );

    let engine = Engine::new(store, &config);
    let session = Session::new(user_name, viewer_zone);

    let due = engine.due_soon_now(&session).await?;
    if due.is_empty() {
        println!(
            "There are no appointments happening in the next {} minutes.",
            config.lookahead_minutes
        );
    } else {
        println!("Upcoming appointments:");
        for summary in &due {
            println!("  {summary}");
        }
    }

    let hours = engine.available_hours(viewer_zone);
    match (hours.first(), hours.last()) {
        (Some(first), Some(last)) => println!(
            "Selectable times in {viewer_zone}: {first} to {last} ({} choices)",
            hours.len()
        ),
        _ => println!("No selectable times in {viewer_zone} today."),
    }

    Ok(())
}
