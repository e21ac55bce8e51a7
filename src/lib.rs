//! Procedural world engine for a tile-based sandbox game: deterministic
//! terrain synthesis from a world seed and diff-based chunk persistence.

pub mod util;

pub mod block;
pub mod biome;

pub mod chunk;
pub mod world;
pub mod storage;
pub mod serde;
pub mod gen;
