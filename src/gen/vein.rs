//! Ore vein placement by stochastic flood fill.

use crate::chunk::{self, Chunk, CHUNK_HEIGHT, CHUNK_WIDTH};
use crate::util::WorldRandom;
use crate::biome::VeinRule;
use crate::block;


/// Place a single vein in the chunk.
///
/// The seed cell is picked uniformly within the rule's height band; if it
/// is not stone the attempt is spent with no placement. The fill then
/// expands 4-connected, each visited stone neighbor converting and being
/// enqueued only when it passes the rule's continuation probability. This
/// is not a BFS to exhaustion: the stochastic gate usually terminates the
/// fill after a handful of cells.
pub fn generate(chunk: &mut Chunk, rule: &VeinRule, rand: &mut WorldRandom) {

    let min = rule.min_height.max(0);
    let max = rule.max_height.min(CHUNK_HEIGHT as i32 - 1);
    if min > max {
        return;
    }

    let x = rand.next_int_bounded(CHUNK_WIDTH as i32);
    let y = rand.next_int_range(min, max);

    let index = chunk::calc_index(x as usize, y as usize);
    if chunk.get_block(index) != block::STONE {
        return;
    }

    chunk.set_block(index, rule.block);
    let mut queue = vec![(x, y)];

    while let Some((x, y)) = queue.pop() {
        for (nx, ny) in [(x - 1, y), (x + 1, y), (x, y - 1), (x, y + 1)] {

            if nx < 0 || nx >= CHUNK_WIDTH as i32 || ny < 0 || ny >= CHUNK_HEIGHT as i32 {
                continue;
            }

            let index = chunk::calc_index(nx as usize, ny as usize);
            if chunk.get_block(index) == block::STONE && rand.next_float() < rule.expand_chance {
                chunk.set_block(index, rule.block);
                queue.push((nx, ny));
            }

        }
    }

}
