//! Protocol module containing the VATP message types and text codec.

pub mod codec;
pub mod messages;

pub use codec::{decode_block, encode, BlockDecoder};
pub use messages::*;
