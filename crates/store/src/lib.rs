//! Canonical in-memory record state plus the derived views over it.
//!
//! `RecordStore` is an explicitly constructed state object: the binary
//! owns one behind a lock and hands references around, tests build a
//! fresh one per case. Views and scoring are pure functions over store
//! snapshots; the store's version counter is the invalidation key for
//! anything a consumer wants to cache.

pub mod record_store;
pub mod scorer;
pub mod view;

pub use record_store::{RecordStore, StoreConfig};
pub use scorer::{Proximity, classify, entry_distance};
pub use view::{
    DirectionFilter, MAX_SORT_KEYS, SignalFilter, SortDir, SortField, SortKey, ViewState,
    compute_view,
};
