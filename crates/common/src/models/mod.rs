pub mod candle;
pub mod quote;
pub mod signal;
pub mod swing;

pub use candle::Candle;
pub use quote::{QuoteUpdate, SymbolMeta, SymbolQuote};
pub use signal::{Direction, Signal, SwingLevel};
pub use swing::{SwingKind, SwingPoint};
