//! Result row decoding

pub mod codec;

pub use codec::decode_rows;
