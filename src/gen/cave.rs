//! Cave carving.

use crate::chunk::{self, Chunk, CHUNK_HEIGHT, CHUNK_WIDTH};
use crate::util::{NoiseGenerator, WorldRandom};
use crate::block;


/// Maximum carved radius of a cave cross-section.
const MAX_RADIUS: i32 = 4;
/// Vertical center the depth noise modulates around.
const BASE_DEPTH: f64 = 30.0;


/// Carve a single cave across a random span of columns.
///
/// The radius and vertical center of the cross-section are sampled per
/// column from the cave's own noise streams, then a filled disc is
/// rasterized with the midpoint-circle error terms. Only stone cells
/// inside chunk bounds are converted to air.
pub fn generate(
    chunk: &mut Chunk,
    radius_noise: &NoiseGenerator,
    depth_noise: &NoiseGenerator,
    rand: &mut WorldRandom,
) {

    let start = rand.next_int_bounded(CHUNK_WIDTH as i32);
    let length = rand.next_int_range(4, CHUNK_WIDTH as i32);

    // Columns running past the chunk edge are clipped, caves are
    // self-contained per chunk.
    for x in start..(start + length).min(CHUNK_WIDTH as i32) {

        let radius = (2.0 + radius_noise.generate(x as i64)).round() as i32;
        let radius = radius.clamp(1, MAX_RADIUS);
        let center = (BASE_DEPTH + depth_noise.generate(x as i64)).round() as i32;

        carve_disc(chunk, x, center, radius);

    }

}

/// Rasterize a filled disc without trigonometry: `a` is the shrinking
/// octant radius, `b` the growing orthogonal offset, `t1`/`t2` the standard
/// circle error terms deciding when `a` shrinks.
fn carve_disc(chunk: &mut Chunk, cx: i32, cy: i32, radius: i32) {

    let mut a = radius;
    let mut b = 0;
    let mut t1 = radius / 16;

    while a >= b {

        carve_span(chunk, cx - a, cx + a, cy - b);
        carve_span(chunk, cx - a, cx + a, cy + b);
        carve_span(chunk, cx - b, cx + b, cy - a);
        carve_span(chunk, cx - b, cx + b, cy + a);

        b += 1;
        t1 += b;
        let t2 = t1 - a;
        if t2 >= 0 {
            t1 = t2;
            a -= 1;
        }

    }

}

/// Clear a horizontal run of stone cells to air, clipped to chunk bounds.
/// Non-solid cells (air, water, surface blocks) are never converted.
fn carve_span(chunk: &mut Chunk, x0: i32, x1: i32, y: i32) {

    if y < 0 || y >= CHUNK_HEIGHT as i32 {
        return;
    }

    for x in x0.max(0)..=x1.min(CHUNK_WIDTH as i32 - 1) {
        let index = chunk::calc_index(x as usize, y as usize);
        if chunk.get_block(index) == block::STONE {
            chunk.set_block(index, block::AIR);
        }
    }

}
