use std::sync::Arc;

use anyhow::bail;
use async_trait::async_trait;
use tokio::sync::{RwLock, broadcast, mpsc};
use tracing::{info, warn};
use uuid::Uuid;

use common::actors::{Actor, ActorType, ControlMessage};
use market_data::MarketEvent;
use store::RecordStore;

/// Applies every accepted stream event to the record store. Each event
/// is applied under the write lock in arrival order, so readers always
/// see whole entities.
pub struct SyncService {
    id: Uuid,
    store: Arc<RwLock<RecordStore>>,
    market_rx: broadcast::Receiver<Arc<MarketEvent>>,
}

#[async_trait]
impl Actor for SyncService {
    fn id(&self) -> Uuid {
        self.id
    }

    fn name(&self) -> ActorType {
        ActorType::SyncActor
    }

    async fn run(&mut self, supervisor_tx: mpsc::Sender<ControlMessage>) -> anyhow::Result<()> {
        let heartbeat_handle = self.spawn_heartbeat(supervisor_tx.clone());

        info!("Starting store sync service");

        loop {
            match self.market_rx.recv().await {
                Ok(event) => {
                    let mut store = self.store.write().await;
                    match &*event {
                        MarketEvent::Signal(signal) => store.add_signal(signal.clone()),
                        MarketEvent::Candle(candle) => store.upsert_candle(candle.clone()),
                        MarketEvent::Swing(swing) => store.append_swing(swing.clone()),
                        MarketEvent::Quote(update) => store.upsert_quote(update.clone()),
                        MarketEvent::Status(status) => store.set_status(*status),
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!("Sync service lagged: missed {} events", n);
                }
                Err(_) => {
                    let err_msg = "Market event channel closed. Stopping service.".to_string();
                    heartbeat_handle.abort();
                    supervisor_tx
                        .send(ControlMessage::Error(self.id, err_msg.clone()))
                        .await?;
                    bail!(err_msg);
                }
            }
        }
    }
}

impl SyncService {
    pub fn new(
        store: Arc<RwLock<RecordStore>>,
        market_rx: broadcast::Receiver<Arc<MarketEvent>>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            store,
            market_rx,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use common::models::{Candle, Direction, Signal};
    use common::status::{Selection, StreamStatus};
    use store::StoreConfig;

    fn shared_store() -> Arc<RwLock<RecordStore>> {
        Arc::new(RwLock::new(RecordStore::new(
            Selection::new("BTCUSDT", "1h"),
            StoreConfig::default(),
        )))
    }

    fn candle(secs: i64, close: f64) -> Candle {
        Candle {
            symbol: "BTCUSDT".to_string(),
            timeframe: "1h".to_string(),
            time: Utc.timestamp_opt(secs, 0).unwrap(),
            open: close,
            high: close,
            low: close,
            close,
            volume: 1.0,
        }
    }

    fn signal(id: &str) -> Signal {
        Signal {
            id: id.to_string(),
            symbol: "BTCUSDT".to_string(),
            timeframe: "1h".to_string(),
            direction: Direction::Long,
            time: Utc.timestamp_opt(0, 0).unwrap(),
            price: 100.0,
            entry1: None,
            entry2: None,
            stop_loss: None,
            tp1: None,
            tp2: None,
            tp3: None,
            swing_high: None,
            swing_low: None,
            confluence: None,
        }
    }

    #[tokio::test]
    async fn events_are_applied_to_the_store_in_arrival_order() {
        let store = shared_store();
        let (market_tx, market_rx) = broadcast::channel(16);
        let mut service = SyncService::new(store.clone(), market_rx);
        let (supervisor_tx, _supervisor_rx) = mpsc::channel(16);

        let handle = tokio::spawn(async move { service.run(supervisor_tx).await });

        market_tx.send(Arc::new(MarketEvent::Candle(candle(100, 1.0)))).unwrap();
        market_tx.send(Arc::new(MarketEvent::Candle(candle(100, 2.0)))).unwrap();
        market_tx.send(Arc::new(MarketEvent::Signal(signal("s1")))).unwrap();
        market_tx
            .send(Arc::new(MarketEvent::Status(StreamStatus::Connected)))
            .unwrap();

        // Dropping the sender closes the channel and lets the service
        // drain everything before bailing out.
        drop(market_tx);
        let _ = handle.await;

        let store = store.read().await;
        let candles = store.candles("BTCUSDT", "1h");
        assert_eq!(candles.len(), 1);
        assert_eq!(candles[0].close, 2.0);
        assert_eq!(store.signal_ids(), &["s1"]);
        assert_eq!(store.latest_signal().unwrap().id, "s1");
        assert_eq!(store.status(), StreamStatus::Connected);
    }
}
