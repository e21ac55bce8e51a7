//! Chunk lifecycle management: in-memory cache, load-or-generate-or-restore
//! resolution, block queries and mutations, persistence of mutated chunks.
//!
//! Access is single-threaded from the perspective of this core: one logical
//! world update driver calls in synchronously. In a multi-threaded host the
//! caller must serialize `replace_block`/`save` against `load_chunk` for
//! the same chunk id.

use glam::IVec2;
use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::chunk::{self, CHUNK_HEIGHT, CHUNK_SIZE, Chunk};
use crate::serde::chunk::StoredChunk;
use crate::storage::SaveManager;
use crate::gen::MapGenerator;
use crate::biome;


/// Caches chunks by id, resolves load-or-generate-or-restore-diff, and
/// tracks which chunks must be persisted.
pub struct ChunkManager<S: SaveManager> {
    /// The terrain generator, owns the world seed.
    generator: MapGenerator,
    /// Durable storage collaborator.
    storage: S,
    /// Loaded chunks by id.
    chunks: IndexMap<i32, Chunk>,
}

impl<S: SaveManager> ChunkManager<S> {

    pub fn new(generator: MapGenerator, storage: S) -> Self {
        Self {
            generator,
            storage,
            chunks: IndexMap::new(),
        }
    }

    #[inline]
    pub fn generator(&self) -> &MapGenerator {
        &self.generator
    }

    /// Give the storage back, typically to reopen the same world later.
    pub fn into_storage(self) -> S {
        self.storage
    }

    #[inline]
    pub fn is_loaded(&self, id: i32) -> bool {
        self.chunks.contains_key(&id)
    }

    /// Get the chunk for the given id, resolving it if not cached: a stored
    /// record is applied on top of a freshly generated baseline, otherwise
    /// the baseline is used as-is. The chunk is cached before returning.
    pub fn load_chunk(&mut self, id: i32) -> &Chunk {
        if !self.chunks.contains_key(&id) {
            let chunk = self.resolve_chunk(id);
            self.chunks.insert(id, chunk);
        }
        &self.chunks[&id]
    }

    fn resolve_chunk(&mut self, id: i32) -> Chunk {

        let stored = match self.storage.load_chunk(id) {
            Ok(stored) => stored,
            Err(err) => {
                // Terrain is procedurally recoverable, only stored player
                // edits are lost here.
                warn!("unreadable record for chunk {id}, regenerating: {err}");
                None
            }
        };

        let mut chunk = self.generator.generate_chunk(id);

        match stored {
            Some(StoredChunk::Diffs(diffs)) => {
                debug!("restoring {} diffs onto chunk {id}", diffs.len());
                for (index, block) in diffs {
                    chunk.replace_block(index, block);
                }
            }
            Some(StoredChunk::Legacy { biome: key, is_forest, blocks }) => {
                // Legacy snapshots are migrated on load: every cell that
                // departs from the fresh baseline becomes a diff, so the
                // next save rewrites the record in the current scheme.
                debug!("migrating legacy record for chunk {id}");
                for (index, block) in blocks.iter().copied().enumerate().take(CHUNK_SIZE) {
                    if chunk.get_block(index) != block {
                        chunk.replace_block(index, block);
                    }
                }
                if biome::get(key.0, key.1, key.2).is_some() {
                    chunk.set_biome(Some(key));
                }
                chunk.set_forest(is_forest);
            }
            None => {}
        }

        chunk

    }

    /// Get the block at the given world position. Returns `None` when the
    /// vertical coordinate is out of range or the chunk is not loaded:
    /// movement and placement logic probe neighboring and off-screen cells
    /// routinely, so out-of-range queries are an expected condition.
    pub fn get_block(&self, pos: IVec2) -> Option<u8> {

        if pos.y < 0 || pos.y >= CHUNK_HEIGHT as i32 {
            return None;
        }

        let (id, x) = chunk::calc_chunk_id(pos.x);
        let chunk = self.chunks.get(&id)?;
        Some(chunk.get_block(chunk::calc_index(x, pos.y as usize)))

    }

    /// Replace the block at the given world position, recording a diff.
    /// Returns false without mutating when the position is out of range or
    /// the chunk is not loaded.
    pub fn replace_block(&mut self, pos: IVec2, block: u8) -> bool {

        if pos.y < 0 || pos.y >= CHUNK_HEIGHT as i32 {
            return false;
        }

        let (id, x) = chunk::calc_chunk_id(pos.x);
        let Some(chunk) = self.chunks.get_mut(&id) else {
            return false;
        };

        chunk.replace_block(chunk::calc_index(x, pos.y as usize), block);
        true

    }

    /// Persist every cached chunk with a non-empty diff set. Chunks without
    /// diffs are reproducible from the seed and are not written.
    pub fn save(&mut self) {
        for (&id, chunk) in self.chunks.iter() {
            if !chunk.has_diffs() {
                continue;
            }
            if let Err(err) = self.storage.save_chunk(chunk) {
                warn!("failed to save chunk {id}: {err}");
            }
        }
    }

    /// Evict cached chunks out of interaction range of the given center
    /// chunk, saving mutated ones first. A chunk whose save fails stays
    /// cached rather than dropping its edits.
    pub fn retain_near(&mut self, center_id: i32, radius: i32) {
        let storage = &mut self.storage;
        self.chunks.retain(|&id, chunk| {
            if (id - center_id).abs() <= radius {
                return true;
            }
            if chunk.has_diffs() {
                if let Err(err) = storage.save_chunk(chunk) {
                    warn!("failed to save evicted chunk {id}, keeping it loaded: {err}");
                    return true;
                }
            }
            debug!("evicting chunk {id}");
            false
        });
    }

}

#[cfg(test)]
mod tests {

    use crate::chunk::CHUNK_WIDTH;
    use crate::storage::MemoryStorage;
    use crate::block;

    use super::*;

    fn new_manager(seed: i64) -> ChunkManager<MemoryStorage> {
        ChunkManager::new(MapGenerator::new(seed), MemoryStorage::new())
    }

    #[test]
    fn out_of_range_probes_return_nothing() {

        let mut manager = new_manager(12345);
        manager.load_chunk(0);

        assert_eq!(manager.get_block(IVec2::new(0, -1)), None);
        assert_eq!(manager.get_block(IVec2::new(0, CHUNK_HEIGHT as i32)), None);
        // Unloaded chunk, both sides of the origin.
        assert_eq!(manager.get_block(IVec2::new(1000, 10)), None);
        assert_eq!(manager.get_block(IVec2::new(-1000, 10)), None);
        // Loaded chunk answers.
        assert!(manager.get_block(IVec2::new(0, 10)).is_some());

    }

    #[test]
    fn replace_requires_loaded_chunk() {
        let mut manager = new_manager(12345);
        assert!(!manager.replace_block(IVec2::new(0, 10), block::AIR));
        manager.load_chunk(0);
        assert!(manager.replace_block(IVec2::new(0, 10), block::AIR));
        assert_eq!(manager.get_block(IVec2::new(0, 10)), Some(block::AIR));
        assert!(!manager.replace_block(IVec2::new(0, -1), block::AIR));
    }

    #[test]
    fn diff_round_trip_through_storage() {

        // Mutate index 50 of chunk 3 (column 2, height 3), save, reload in
        // a fresh manager and check both the edit and the baseline.
        let mut manager = new_manager(12345);
        manager.load_chunk(3);

        let world_x = 3 * CHUNK_WIDTH as i32 + 2;
        assert!(manager.replace_block(IVec2::new(world_x, 3), block::AIR));

        let chunk = manager.load_chunk(3);
        assert_eq!(chunk.diffs().collect::<Vec<_>>(), [(50, block::AIR)]);

        manager.save();
        let storage = manager.into_storage();

        let mut manager = ChunkManager::new(MapGenerator::new(12345), storage);
        let reloaded = manager.load_chunk(3);
        assert_eq!(reloaded.get_block(50), block::AIR);

        // Every other cell matches a fresh baseline.
        let baseline = MapGenerator::new(12345).generate_chunk(3);
        for index in 0..CHUNK_SIZE {
            if index != 50 {
                assert_eq!(reloaded.get_block(index), baseline.get_block(index));
            }
        }

    }

    #[test]
    fn clean_chunks_are_not_written() {
        let mut manager = new_manager(12345);
        manager.load_chunk(0);
        manager.save();
        let mut storage = manager.into_storage();
        assert!(storage.load_chunk(0).unwrap().is_none());
    }

    #[test]
    fn corrupt_record_regenerates_baseline() {

        let mut storage = MemoryStorage::new();
        storage.insert_record(5, b"garbage".to_vec());

        let mut manager = ChunkManager::new(MapGenerator::new(12345), storage);
        let chunk = manager.load_chunk(5);

        let baseline = MapGenerator::new(12345).generate_chunk(5);
        assert_eq!(chunk.blocks(), baseline.blocks());
        assert!(!chunk.has_diffs());

    }

    #[test]
    fn legacy_record_is_migrated() {

        // A legacy full snapshot: the baseline of chunk 2 with one edit.
        // Snow never generates at this depth, so the cell is a real diff.
        let mut legacy_blocks = MapGenerator::new(12345).generate_chunk(2).blocks().to_vec();
        legacy_blocks[100] = block::SNOW;

        let json = serde_json::json!({
            "direction": false,
            "biome": [2, 1, 1],
            "is_forest": true,
            "blocks": legacy_blocks,
            "version": 0.3,
        });

        let mut storage = MemoryStorage::new();
        storage.insert_record(2, json.to_string().into_bytes());

        let mut manager = ChunkManager::new(MapGenerator::new(12345), storage);
        let chunk = manager.load_chunk(2);

        assert_eq!(chunk.get_block(100), block::SNOW);
        assert_eq!(chunk.biome(), Some((2, 1, 1)));
        assert!(chunk.is_forest());
        // Only the departing cell became a diff.
        assert_eq!(chunk.diffs().collect::<Vec<_>>(), [(100, block::SNOW)]);

    }

    #[test]
    fn eviction_saves_dirty_chunks() {

        let mut manager = new_manager(12345);
        manager.load_chunk(0);
        manager.load_chunk(10);
        assert!(manager.replace_block(IVec2::new(10 * CHUNK_WIDTH as i32, 20), block::AIR));

        manager.retain_near(0, 2);
        assert!(manager.is_loaded(0));
        assert!(!manager.is_loaded(10));

        // The evicted chunk's edit survived in storage.
        let mut storage = manager.into_storage();
        match storage.load_chunk(10).unwrap() {
            Some(StoredChunk::Diffs(diffs)) => {
                assert_eq!(diffs, [(20 * CHUNK_WIDTH, block::AIR)]);
            }
            other => panic!("expected diffs record, got {other:?}"),
        }

    }

}
