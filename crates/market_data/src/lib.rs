pub mod connection;
pub mod error;
pub mod remote;
pub mod services;

pub use connection::{Backoff, Connection};
pub use error::TransportError;
pub use services::stream_service::{MarketEvent, StreamService};
