//! Domain types: bars, orders, positions, accounts, trades.

pub mod account;
pub mod bar;
pub mod order;
pub mod position;
pub mod trade;

pub use account::Account;
pub use bar::{Bar, Interval};
pub use order::{OrderIntent, OrderSide};
pub use position::Position;
pub use trade::{Trade, TradeSide};
