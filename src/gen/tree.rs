//! Tree growth.

use crate::chunk::{self, Chunk, CHUNK_HEIGHT, CHUNK_WIDTH};
use crate::util::WorldRandom;
use crate::biome::TreeRule;


/// Grow a single tree on the given column, if the surface allows it.
///
/// The column's surface block must match the rule's expected vegetation
/// bearing block; it is converted to the rule's sub-surface block and the
/// trunk grows upward cell by cell while the target cell holds the
/// grows-in block and the random height budget is not exhausted. The
/// canopy is a vertical run above the trunk plus jittered lateral runs on
/// both sides; a leaf is only placed in a grows-in cell 4-adjacent to an
/// already-placed trunk or leaf cell, so no leaf ever floats disconnected.
pub fn generate(chunk: &mut Chunk, rule: &TreeRule, x: i32, rand: &mut WorldRandom) -> bool {

    let Some(surface_y) = top_surface(chunk, x as usize, rule.grows_in) else {
        return false;
    };

    let surface_index = chunk::calc_index(x as usize, surface_y);
    if chunk.get_block(surface_index) != rule.surface {
        return false;
    }

    // The tree roots into the rule's sub-surface block.
    chunk.set_block(surface_index, rule.sub_surface);

    // Grow the trunk while the height budget lasts and the cell is free.
    let budget = rand.next_int_range(rule.min_trunk, rule.max_trunk);
    let mut top = surface_y;

    for y in surface_y + 1..CHUNK_HEIGHT {
        if (y - surface_y) as i32 > budget {
            break;
        }
        let index = chunk::calc_index(x as usize, y);
        if chunk.get_block(index) != rule.grows_in {
            break;
        }
        chunk.set_block(index, rule.trunk);
        top = y;
    }

    if top == surface_y {
        return false;
    }

    // Central canopy run directly above the trunk.
    let center_height = rand.next_int_range(rule.min_leaves_height, rule.max_leaves_height);
    place_leaf_run(chunk, rule, x, top as i32 + 1, center_height);

    // Lateral runs on both sides, each column's extent independently
    // jittered and shrinking inward by 0..=1 cell per step.
    for side in [-1, 1] {

        let width = rand.next_int_range(rule.min_leaves_width, rule.max_leaves_width);
        let mut height = center_height;

        for step in 1..=width {
            height = (height - rand.next_int_bounded(2)).max(rule.min_leaves_height);
            place_leaf_run(chunk, rule, x + side * step, top as i32, height);
        }

    }

    true

}

/// Find the topmost cell of the column that is not the grows-in block.
fn top_surface(chunk: &Chunk, x: usize, grows_in: u8) -> Option<usize> {
    (0..CHUNK_HEIGHT).rev()
        .find(|&y| chunk.get_block(chunk::calc_index(x, y)) != grows_in)
}

/// Place a vertical run of leaves starting at the given cell, gated per
/// cell by the grows-in check and the 4-adjacency to the tree.
fn place_leaf_run(chunk: &mut Chunk, rule: &TreeRule, x: i32, y0: i32, count: i32) {

    for dy in 0..count {

        let y = y0 + dy;
        if x < 0 || x >= CHUNK_WIDTH as i32 || y < 0 || y >= CHUNK_HEIGHT as i32 {
            continue;
        }

        let index = chunk::calc_index(x as usize, y as usize);
        if chunk.get_block(index) != rule.grows_in {
            continue;
        }
        if !tree_adjacent(chunk, rule, x, y) {
            continue;
        }

        chunk.set_block(index, rule.leaves);

    }

}

/// Check that a cell is 4-adjacent to an already-placed trunk or leaf.
fn tree_adjacent(chunk: &Chunk, rule: &TreeRule, x: i32, y: i32) -> bool {
    [(x - 1, y), (x + 1, y), (x, y - 1), (x, y + 1)].into_iter()
        .filter(|&(nx, ny)| {
            nx >= 0 && nx < CHUNK_WIDTH as i32 && ny >= 0 && ny < CHUNK_HEIGHT as i32
        })
        .any(|(nx, ny)| {
            let b = chunk.get_block(chunk::calc_index(nx as usize, ny as usize));
            b == rule.trunk || b == rule.leaves
        })
}
