//! The terrain data unit: a flat block array plus a diff set recording the
//! cells mutated after generation.

use indexmap::IndexSet;

use crate::biome::EnvKey;
use crate::block;


/// Chunk width along the world's horizontal axis.
pub const CHUNK_WIDTH: usize = 16;
/// Chunk height.
pub const CHUNK_HEIGHT: usize = 128;
/// Internal chunk size, in number of cells per chunk.
pub const CHUNK_SIZE: usize = CHUNK_WIDTH * CHUNK_HEIGHT;


/// Calculate the index in the chunk's block array for the given chunk-local
/// coordinates, row-major by height. Index arithmetic is centralized here,
/// callers never compute `y * width + x` themselves.
#[inline]
pub fn calc_index(x: usize, y: usize) -> usize {
    debug_assert!(x < CHUNK_WIDTH && y < CHUNK_HEIGHT);
    y * CHUNK_WIDTH + x
}

/// Calculate the chunk id and local column for the given world X coordinate.
#[inline]
pub fn calc_chunk_id(x: i32) -> (i32, usize) {
    (x.div_euclid(CHUNK_WIDTH as i32), x.rem_euclid(CHUNK_WIDTH as i32) as usize)
}


/// Data structure storing the terrain of one world slice, the unit of
/// generation, caching and persistence.
pub struct Chunk {
    /// Position of the chunk along the world's horizontal axis, in chunks.
    id: i32,
    /// Environment key of the biome resolved at generation time, if any.
    biome: Option<EnvKey>,
    /// Vegetation density state, persists across regeneration.
    is_forest: bool,
    /// The block id for every cell, row-major by height.
    blocks: Box<ChunkByteArray>,
    /// Flat indices whose value departs from the generated baseline.
    diffs: IndexSet<usize>,
}

/// Type alias for the array storing the block id of every cell.
type ChunkByteArray = [u8; CHUNK_SIZE];

impl Chunk {

    /// Create a new chunk full of air blocks, with an empty diff set.
    pub fn new(id: i32) -> Self {
        Self {
            id,
            biome: None,
            is_forest: false,
            blocks: Box::new([block::AIR; CHUNK_SIZE]),
            diffs: IndexSet::new(),
        }
    }

    #[inline]
    pub fn id(&self) -> i32 {
        self.id
    }

    #[inline]
    pub fn biome(&self) -> Option<EnvKey> {
        self.biome
    }

    #[inline]
    pub fn set_biome(&mut self, biome: Option<EnvKey>) {
        self.biome = biome;
    }

    #[inline]
    pub fn is_forest(&self) -> bool {
        self.is_forest
    }

    #[inline]
    pub fn set_forest(&mut self, is_forest: bool) {
        self.is_forest = is_forest;
    }

    /// Get the block id at the given flat index.
    /// Panics if the index is out of the chunk's bounds.
    #[inline]
    pub fn get_block(&self, index: usize) -> u8 {
        self.blocks[index]
    }

    /// Set a block without recording a diff. This is the write path of the
    /// generator while synthesizing the baseline.
    #[inline]
    pub fn set_block(&mut self, index: usize, block: u8) {
        self.blocks[index] = block;
    }

    /// Replace a block as a gameplay mutation: updates the cell and
    /// unconditionally records the index in the diff set. Callers are
    /// responsible for meaningful edits, the chunk does not recompute
    /// whether the value actually departs from the baseline.
    pub fn replace_block(&mut self, index: usize, block: u8) {
        self.blocks[index] = block;
        self.diffs.insert(index);
    }

    /// Read view of the diff set for persistence, in insertion order.
    pub fn diffs(&self) -> impl Iterator<Item = (usize, u8)> + '_ {
        self.diffs.iter().map(|&index| (index, self.blocks[index]))
    }

    #[inline]
    pub fn has_diffs(&self) -> bool {
        !self.diffs.is_empty()
    }

    /// The whole block array, row-major by height.
    #[inline]
    pub fn blocks(&self) -> &[u8] {
        &self.blocks[..]
    }

}
