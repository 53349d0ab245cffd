use std::sync::Arc;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use tokio::net::TcpStream;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::time;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use common::actors::{Actor, ActorType, ControlMessage};
use common::models::{Candle, QuoteUpdate, Signal, SwingPoint};
use common::status::{Selection, StreamStatus};

use crate::connection::{Backoff, Connection, MAX_RECONNECT_ATTEMPTS};
use crate::error::TransportError;
use crate::remote::stream_event::{StreamFrame, decode_frame};

/// Events fanned out to consumers. The gateway itself holds no entity
/// state; everything it accepts is forwarded verbatim.
#[derive(Debug)]
pub enum MarketEvent {
    Signal(Signal),
    Candle(Candle),
    Swing(SwingPoint),
    Quote(QuoteUpdate),
    Status(StreamStatus),
}

#[derive(Serialize)]
struct SubscribeRequest<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    symbol: &'a str,
    timeframe: &'a str,
}

enum SessionEnd {
    /// Socket closed or errored; retry with backoff.
    Dropped,
    /// The active pair changed; tear down and resubscribe fresh.
    SelectionChanged,
    /// The selection channel is gone; the system is shutting down.
    ChannelClosed,
}

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Owns one streaming connection: connect, subscribe to the selected
/// (symbol, timeframe), decode frames and forward them, reconnect with
/// exponential backoff. Changing the selection tears the socket down and
/// opens a new one without leaking the old session's timers.
pub struct StreamService {
    id: Uuid,
    endpoint: String,
    selection_rx: watch::Receiver<Selection>,
    market_tx: broadcast::Sender<Arc<MarketEvent>>,
}

#[async_trait]
impl Actor for StreamService {
    fn id(&self) -> Uuid {
        self.id
    }

    fn name(&self) -> ActorType {
        ActorType::StreamActor
    }

    async fn run(&mut self, supervisor_tx: mpsc::Sender<ControlMessage>) -> anyhow::Result<()> {
        let heartbeat_handle = self.spawn_heartbeat(supervisor_tx.clone());

        info!("Starting stream gateway for {}", self.endpoint);

        'session: loop {
            let selection = self.selection_rx.borrow_and_update().clone();
            let mut conn = Connection::new(Backoff::standard());

            loop {
                conn.on_connecting();
                self.publish_status(conn.status());

                match tokio_tungstenite::connect_async(self.endpoint.as_str()).await {
                    Ok((ws, _)) => {
                        conn.on_open();
                        self.publish_status(conn.status());
                        info!(
                            "Connected, subscribing to {} {}",
                            selection.symbol, selection.timeframe
                        );
                        match self.pump(ws, &selection).await {
                            SessionEnd::Dropped => {}
                            SessionEnd::SelectionChanged => {
                                debug!("Selection changed, resubscribing");
                                continue 'session;
                            }
                            SessionEnd::ChannelClosed => break 'session,
                        }
                    }
                    Err(e) => {
                        error!("Connection failed: {}", TransportError::Socket(e));
                    }
                }

                match conn.on_disconnect() {
                    Some(delay) => {
                        self.publish_status(conn.status());
                        warn!("Stream dropped, reconnecting in {}s", delay.as_secs());
                        tokio::select! {
                            _ = time::sleep(delay) => {}
                            changed = self.selection_rx.changed() => {
                                if changed.is_err() {
                                    break 'session;
                                }
                                continue 'session;
                            }
                        }
                    }
                    None => {
                        self.publish_status(StreamStatus::Failed);
                        let msg = TransportError::RetryBudgetExhausted {
                            attempts: MAX_RECONNECT_ATTEMPTS,
                        }
                        .to_string();
                        error!("{msg}");
                        supervisor_tx
                            .send(ControlMessage::Error(self.id, msg))
                            .await?;
                        // Terminal until the user picks a pair again.
                        if self.selection_rx.changed().await.is_err() {
                            break 'session;
                        }
                        continue 'session;
                    }
                }
            }
        }

        heartbeat_handle.abort();
        info!("Stream gateway stopped");
        Ok(())
    }
}

impl StreamService {
    pub fn new(
        endpoint: String,
        selection_rx: watch::Receiver<Selection>,
        market_tx: broadcast::Sender<Arc<MarketEvent>>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            endpoint,
            selection_rx,
            market_tx,
        }
    }

    async fn pump(&mut self, ws: WsStream, selection: &Selection) -> SessionEnd {
        let (mut write, mut read) = ws.split();
        // Handed to the frame handler so the select arms below only
        // borrow disjoint fields of self.
        let market_tx = self.market_tx.clone();

        let subscribe = SubscribeRequest {
            kind: "subscribe",
            symbol: &selection.symbol,
            timeframe: &selection.timeframe,
        };
        let payload = match serde_json::to_string(&subscribe) {
            Ok(payload) => payload,
            Err(e) => {
                error!("Failed to encode subscribe message: {e}");
                return SessionEnd::Dropped;
            }
        };
        if let Err(e) = write.send(Message::Text(payload.into())).await {
            error!("Failed to send subscribe message: {e}");
            return SessionEnd::Dropped;
        }

        loop {
            tokio::select! {
                changed = self.selection_rx.changed() => {
                    return if changed.is_ok() {
                        SessionEnd::SelectionChanged
                    } else {
                        SessionEnd::ChannelClosed
                    };
                }
                frame = read.next() => {
                    match frame {
                        Some(Ok(Message::Text(text))) => handle_text(&market_tx, &text, selection),
                        Some(Ok(Message::Ping(payload))) => {
                            let _ = write.send(Message::Pong(payload)).await;
                        }
                        Some(Ok(Message::Close(_))) => {
                            debug!("Close frame received");
                            return SessionEnd::Dropped;
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            error!("WebSocket error: {e}");
                            return SessionEnd::Dropped;
                        }
                        None => {
                            debug!("Stream ended");
                            return SessionEnd::Dropped;
                        }
                    }
                }
            }
        }
    }

    fn publish_status(&self, status: StreamStatus) {
        publish(&self.market_tx, MarketEvent::Status(status));
    }
}

fn handle_text(market_tx: &broadcast::Sender<Arc<MarketEvent>>, text: &str, selection: &Selection) {
    match decode_frame(text) {
        Ok(frame) => dispatch_frame(market_tx, frame, selection),
        Err(e) => warn!("Dropping undecodable frame: {e}"),
    }
}

/// Forward one decoded frame. Candles and swings for a pair other than
/// the current selection are stale leftovers from a torn-down
/// subscription and are dropped here.
fn dispatch_frame(
    market_tx: &broadcast::Sender<Arc<MarketEvent>>,
    frame: StreamFrame,
    selection: &Selection,
) {
    match frame {
        StreamFrame::Signal { data } => match data.to_domain() {
            Ok(signal) => publish(market_tx, MarketEvent::Signal(signal)),
            Err(e) => warn!("Dropping signal payload: {e}"),
        },
        StreamFrame::Candle { data } => match data.to_domain() {
            Ok(candle) => {
                if selection.matches(&candle.symbol, &candle.timeframe) {
                    publish(market_tx, MarketEvent::Candle(candle));
                } else {
                    debug!(
                        "Dropping stale candle for {}/{}",
                        candle.symbol, candle.timeframe
                    );
                }
            }
            Err(e) => warn!("Dropping candle payload: {e}"),
        },
        StreamFrame::Swing { data } => match data.to_domain() {
            Ok(swing) => {
                if selection.matches(&swing.symbol, &swing.timeframe) {
                    publish(market_tx, MarketEvent::Swing(swing));
                } else {
                    debug!(
                        "Dropping stale swing for {}/{}",
                        swing.symbol, swing.timeframe
                    );
                }
            }
            Err(e) => warn!("Dropping swing payload: {e}"),
        },
        StreamFrame::SymbolUpdate { data } | StreamFrame::MarketcapUpdate { data } => {
            publish(market_tx, MarketEvent::Quote(data.to_domain()));
        }
        StreamFrame::Indicator { .. } => {
            debug!("Ignoring server-computed indicator frame");
        }
        StreamFrame::Connected { message } => {
            debug!("Server hello: {}", message.unwrap_or_default());
        }
        StreamFrame::Subscribed {
            symbol, timeframe, ..
        } => {
            info!(
                "Subscription confirmed for {} {}",
                symbol.unwrap_or_default(),
                timeframe.unwrap_or_default()
            );
        }
        StreamFrame::Error { message } => {
            warn!("Server error: {}", message.unwrap_or_default());
        }
        StreamFrame::Unrecognized => {
            warn!("Unrecognized frame kind, dropping");
        }
    }
}

fn publish(market_tx: &broadcast::Sender<Arc<MarketEvent>>, event: MarketEvent) {
    // Send fails only when no consumer is subscribed yet; nothing to do
    // about that here.
    let _ = market_tx.send(Arc::new(event));
}
