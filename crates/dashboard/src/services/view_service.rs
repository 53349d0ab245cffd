use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{RwLock, mpsc};
use tokio::time;
use tracing::{debug, info};
use uuid::Uuid;

use common::actors::{Actor, ActorType, ControlMessage};
use indicators::{ZigZagSettings, ema_set, rsi, zigzag};
use store::{
    RecordStore, SignalFilter, SortDir, SortField, SortKey, ViewState, classify, entry_distance,
};

const TICK_SECS: u64 = 10;
const RSI_PERIOD: usize = 14;
const EMA_PERIODS: [usize; 4] = [20, 50, 100, 200];

/// Periodically derives the presentation view and the active pair's
/// indicator series off store snapshots, logging a liveness summary.
/// Indicator math runs off the lock; the store's version counter decides
/// whether there is anything new to compute at all.
pub struct ViewService {
    id: Uuid,
    store: Arc<RwLock<RecordStore>>,
    filter: SignalFilter,
    sort: Vec<SortKey>,
    view_state: ViewState,
    last_version: u64,
}

#[async_trait]
impl Actor for ViewService {
    fn id(&self) -> Uuid {
        self.id
    }

    fn name(&self) -> ActorType {
        ActorType::ViewActor
    }

    async fn run(&mut self, supervisor_tx: mpsc::Sender<ControlMessage>) -> anyhow::Result<()> {
        let _heartbeat = self.spawn_heartbeat(supervisor_tx.clone());

        info!("Starting view service");
        let mut interval = time::interval(Duration::from_secs(TICK_SECS));

        loop {
            interval.tick().await;
            self.refresh().await;
        }
    }
}

impl ViewService {
    pub fn new(store: Arc<RwLock<RecordStore>>) -> Self {
        Self {
            id: Uuid::new_v4(),
            store,
            filter: SignalFilter::default(),
            sort: vec![SortKey::new(SortField::SignalTime, SortDir::Desc)],
            view_state: ViewState::new(),
            last_version: 0,
        }
    }

    async fn refresh(&mut self) {
        let store = self.store.read().await;
        if store.version() == self.last_version {
            debug!("Store unchanged, skipping view refresh");
            return;
        }
        self.last_version = store.version();

        let view = self.view_state.render(
            store.signal_ids(),
            &self.filter,
            &self.sort,
            store.signals(),
            store.quotes(),
        );

        let mut leaders = String::new();
        for id in view.iter().take(3) {
            if let Some(signal) = store.signal(id) {
                let quote = store.quotes().get(&signal.symbol).map(|q| q.last_price);
                let score = entry_distance(quote, signal.entry_price());
                leaders.push_str(&format!(
                    "[{} {:?} {:?}] ",
                    signal.symbol,
                    signal.direction,
                    classify(score)
                ));
            }
        }

        let selection = store.selection().clone();
        let status = store.status();
        let candles = store.candle_snapshot(&selection.symbol, &selection.timeframe);
        drop(store);

        let rsi_series = rsi(&candles, RSI_PERIOD);
        let ema_series = ema_set(&candles, &EMA_PERIODS);
        let pivots = zigzag(&candles, &ZigZagSettings::default());

        info!(
            "VIEW: status={:?} {} {}: {} signals, {} candles, rsi={}, ema_sets={}, pivots={} {}",
            status,
            selection.symbol,
            selection.timeframe,
            view.len(),
            candles.len(),
            rsi_series
                .last()
                .map(|p| format!("{:.1}", p.value))
                .unwrap_or_else(|| "n/a".to_string()),
            ema_series.iter().filter(|(_, s)| !s.is_empty()).count(),
            pivots.len(),
            leaders
        );
    }
}
