//! Wire protocol: message types and the JSON codec.

pub mod codec;
pub mod types;

pub use codec::{decode, encode};
pub use types::{ClientMessage, MoveUpdate, RelayMessage};
