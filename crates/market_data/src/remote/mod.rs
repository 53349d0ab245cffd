pub mod snapshot_client;
pub mod stream_event;

pub use snapshot_client::{SignalSource, SnapshotClient};
pub use stream_event::{
    CandleEvent, QuoteEvent, SignalEvent, StreamFrame, SwingEvent, decode_frame,
};
