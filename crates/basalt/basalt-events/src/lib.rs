#![forbid(unsafe_code)]

pub mod l2;
pub mod price;

pub use l2::{L2Update, MessageHeader, PriceLevel, Quantity, SecurityId, DEPTH, MSG_TYPE_L2};
pub use price::Price;
