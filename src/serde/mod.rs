//! Serialization of persisted chunk records.

pub mod chunk;
