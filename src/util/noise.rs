//! Seeded 1D coherent noise with octave summation.

use super::WorldRandom;


const TABLE_SIZE: usize = 256;


/// A seeded 1D gradient noise generator. Once the permutation table is
/// built, [`generate`](Self::generate) is a pure function of the position:
/// no mutable state leaks between calls.
#[derive(Debug, Clone)]
pub struct NoiseGenerator {
    /// Permutation table shuffled from the generator's seed.
    permutations: Box<[u8; TABLE_SIZE]>,
    /// Output amplitude, the result lies in `[-amplitude, amplitude]`.
    amplitude: f64,
    /// Base spatial frequency of the first octave.
    scale: f64,
    /// Number of summed octaves.
    octaves: u32,
    /// Per-octave amplitude decay.
    persistence: f64,
    /// Per-octave frequency growth.
    lacunarity: f64,
}

impl NoiseGenerator {

    /// Create a new noise generator, shuffling the permutation table with a
    /// PRNG seeded from the given seed.
    pub fn new(seed: i64, amplitude: f64, scale: f64, octaves: u32, persistence: f64, lacunarity: f64) -> Self {

        let mut rand = WorldRandom::new(seed);
        let mut permutations = Box::new(std::array::from_fn::<u8, TABLE_SIZE, _>(|i| i as u8));

        for index in 0..TABLE_SIZE {
            let swap_index = rand.next_int_bounded((TABLE_SIZE - index) as i32) as usize + index;
            permutations.swap(index, swap_index);
        }

        Self {
            permutations,
            amplitude,
            scale,
            octaves,
            persistence,
            lacunarity,
        }

    }

    /// Hash a grid cell into a ±1 gradient from the permutation parity. The
    /// cell index wraps modulo the table size so unbounded and negative
    /// positions are valid.
    #[inline]
    fn grad(&self, cell: i64) -> f64 {
        let index = cell.rem_euclid(TABLE_SIZE as i64) as usize;
        if self.permutations[index] & 1 == 0 { 1.0 } else { -1.0 }
    }

    /// Get the octave-summed, amplitude-normalized noise value at the given
    /// position. Deterministic for a given (seed, position) pair. The
    /// position is a wide integer so that world-space sampling of extreme
    /// chunk ids cannot overflow on the caller's side.
    pub fn generate(&self, position: i64) -> f64 {

        let mut total = 0.0;
        let mut amplitude = 1.0;
        let mut amplitude_sum = 0.0;
        let mut frequency = self.scale;

        for _ in 0..self.octaves {

            let x = position as f64 * frequency;
            let x_floor = x.floor();
            let t = x - x_floor;
            let cell = x_floor as i64;

            let v0 = self.grad(cell) * t;
            let v1 = self.grad(cell + 1) * (t - 1.0);
            total += lerp(fade(t), v0, v1) * amplitude;

            amplitude_sum += amplitude;
            amplitude *= self.persistence;
            frequency *= self.lacunarity;

        }

        // Pathological octave configurations must not divide by zero.
        if amplitude_sum == 0.0 {
            return 0.0;
        }

        total / amplitude_sum * self.amplitude

    }

}

#[inline]
fn lerp(factor: f64, from: f64, to: f64) -> f64 {
    from + factor * (to - from)
}

/// Smoothstep fade curve.
#[inline]
fn fade(t: f64) -> f64 {
    t * t * (3.0 - 2.0 * t)
}
