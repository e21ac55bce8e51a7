//! Pseudo-random number generation for world synthesis.

use std::num::Wrapping;


const MULTIPLIER: Wrapping<i64> = Wrapping(0x5DEECE66D);
const ADDEND: Wrapping<i64> = Wrapping(0xB);
const MASK: Wrapping<i64> = Wrapping((1 << 48) - 1);

const FLOAT_DIV: f32 = (1u32 << 24) as f32;


#[inline]
fn initial_scramble(seed: i64) -> Wrapping<i64> {
    (Wrapping(seed) ^ MULTIPLIER) & MASK
}


/// A 48-bit linear congruential PRNG. Every randomized decision of world
/// generation draws from an explicitly-constructed instance whose seed is a
/// pure function of (world seed, chunk id, feature), never from ambient
/// process state.
#[derive(Debug, Clone)]
pub struct WorldRandom {
    seed: Wrapping<i64>,
}

impl WorldRandom {

    #[inline]
    pub fn new(seed: i64) -> WorldRandom {
        WorldRandom { seed: initial_scramble(seed) }
    }

    #[inline]
    fn next(&mut self, bits: u8) -> i32 {
        self.seed = (self.seed * MULTIPLIER + ADDEND) & MASK;
        (self.seed.0 as u64 >> (48 - bits)) as i32
    }

    #[inline]
    pub fn next_int(&mut self) -> i32 {
        self.next(32)
    }

    /// Get the next pseudo-random integer in `0..bound`.
    pub fn next_int_bounded(&mut self, bound: i32) -> i32 {

        if (bound & -bound) == bound {
            (((bound as i64).wrapping_mul(self.next(31) as i64)) >> 31) as i32
        } else {

            let mut bits;
            let mut val;

            loop {
                bits = self.next(31);
                val = bits.rem_euclid(bound);
                if bits - val + (bound - 1) >= 0 {
                    break;
                }
            }

            val

        }

    }

    /// Get the next pseudo-random integer in `min..=max`.
    #[inline]
    pub fn next_int_range(&mut self, min: i32, max: i32) -> i32 {
        min + self.next_int_bounded(max - min + 1)
    }

    pub fn next_long(&mut self) -> i64 {
        ((self.next(32) as i64) << 32).wrapping_add(self.next(32) as i64)
    }

    /// Get the next pseudo-random single-precision float in `[0, 1)`.
    pub fn next_float(&mut self) -> f32 {
        self.next(24) as f32 / FLOAT_DIV
    }

    /// Pick an index by weighted random choice. A zero total weight falls
    /// back to the first index.
    pub fn next_weighted_index(&mut self, weights: &[u32]) -> usize {

        let total: u32 = weights.iter().sum();
        if total == 0 {
            return 0;
        }

        let mut roll = self.next_int_bounded(total as i32) as u32;
        for (index, &weight) in weights.iter().enumerate() {
            if roll < weight {
                return index;
            }
            roll -= weight;
        }

        weights.len() - 1

    }

}
