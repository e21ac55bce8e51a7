//! Deterministic randomness and noise utilities.

mod rand;
mod noise;

pub use rand::WorldRandom;
pub use noise::NoiseGenerator;
