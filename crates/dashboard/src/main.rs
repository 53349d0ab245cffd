use std::{env, sync::Arc};

use tokio::sync::{RwLock, broadcast, watch};
use tracing::{debug, info, warn};

use common::actors::ActorType;
use common::logger;
use common::status::Selection;
use market_data::MarketEvent;
use market_data::remote::{SignalSource, SnapshotClient};
use market_data::services::stream_service::StreamService;
use store::{RecordStore, StoreConfig};

use crate::actors::supervisor::Supervisor;
use crate::services::sync_service::SyncService;
use crate::services::view_service::ViewService;

mod actors;
mod services;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logger::setup_logger();
    dotenvy::dotenv().ok();
    debug!("Dashboard starting up...");

    let stream_endpoint =
        env::var("STREAM_ENDPOINT").unwrap_or_else(|_| "ws://localhost:8000/ws".to_string());
    let api_base =
        env::var("API_BASE_URL").unwrap_or_else(|_| "http://localhost:8000/".to_string());
    let symbol = env::var("SYMBOL").unwrap_or_else(|_| "BTCUSDT".to_string());
    let timeframe = env::var("TIMEFRAME").unwrap_or_else(|_| "1h".to_string());

    let selection = Selection::new(symbol, timeframe);
    let shared_store = Arc::new(RwLock::new(RecordStore::new(
        selection.clone(),
        StoreConfig::default(),
    )));

    // Seed the store from REST before the stream takes over. Both
    // fetches are best-effort: the stream alone can fill the store.
    let snapshot = SnapshotClient::new(&api_base)?;
    match snapshot.fetch_symbols().await {
        Ok(symbols) => info!("{} symbols available", symbols.len()),
        Err(e) => warn!("Symbol metadata fetch failed: {e}"),
    }
    if let Err(e) = seed_store(&shared_store, &snapshot).await {
        warn!("Signal snapshot seeding failed: {e}");
    }

    let (selection_tx, selection_rx) = watch::channel(selection);
    let (market_tx, _) = broadcast::channel::<Arc<MarketEvent>>(10_000);

    let mut supervisor = Supervisor::new();

    let tx_for_gateway = market_tx.clone();
    let rx_for_gateway = selection_rx.clone();
    supervisor.register_actor(
        ActorType::StreamActor,
        Box::new(move || {
            Box::new(StreamService::new(
                stream_endpoint.clone(),
                rx_for_gateway.clone(),
                tx_for_gateway.clone(),
            ))
        }),
    );

    let store_for_sync = shared_store.clone();
    let rx_for_sync = market_tx.subscribe();
    supervisor.register_actor(
        ActorType::SyncActor,
        Box::new(move || {
            Box::new(SyncService::new(
                store_for_sync.clone(),
                rx_for_sync.resubscribe(),
            ))
        }),
    );

    let store_for_view = shared_store.clone();
    supervisor.register_actor(
        ActorType::ViewActor,
        Box::new(move || Box::new(ViewService::new(store_for_view.clone()))),
    );

    // Held for the whole run; dropping it would shut the gateway down.
    let _selection_tx = selection_tx;

    supervisor.start().await;
    Ok(())
}

/// Apply the snapshot oldest-first so the store's newest-first window
/// ends up in snapshot order.
async fn seed_store(
    store: &Arc<RwLock<RecordStore>>,
    source: &dyn SignalSource,
) -> anyhow::Result<()> {
    let signals = source.fetch_signals().await?;
    let count = signals.len();
    let mut guard = store.write().await;
    for signal in signals.into_iter().rev() {
        guard.add_signal(signal);
    }
    info!("Seeded store with {count} snapshot signals");
    Ok(())
}
