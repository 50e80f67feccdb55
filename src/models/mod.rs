//! Domain models shared across the agent.

pub mod bar;
pub mod order;
pub mod position;

pub use bar::Bar;
pub use order::{BrokerPosition, LatestTrade, OrderReceipt, OrderRequest, OrderSide};
pub use position::Position;
