//! Deterministic chunk generation.
//!
//! For a fixed world seed, [`MapGenerator::generate_chunk`] is a pure
//! function of the chunk id: chunks can be generated in any order, any
//! number of times, by any process replica, and produce bit-identical
//! results. Every randomized decision draws from a per-chunk stream seeded
//! from (seed, id), and every sub-feature noise stream is seeded from
//! (seed, id, feature tag, iteration index).

use tracing::trace;

use crate::biome::{self, Biome, HUMIDITY, TEMPERATURE};
use crate::chunk::{self, Chunk, CHUNK_HEIGHT, CHUNK_WIDTH};
use crate::util::{NoiseGenerator, WorldRandom};
use crate::block;

// Feature generators.
pub mod vein;
pub mod cave;
pub mod tree;


/// Air cells below this height are flooded at generation.
pub const SEA_LEVEL: usize = 58;

/// Terrain height the height noise modulates around.
const BASE_HEIGHT: f64 = 64.0;
/// Output amplitude of the height noise.
const HEIGHT_AMPLITUDE: f64 = 36.0;

/// Chunk seed mixing multiplier.
const CHUNK_SEED_MUL: i64 = 341873128712;
/// Iteration index mixing multiplier for feature seeds.
const FEATURE_INDEX_MUL: i64 = 132897987541;

// Feature tags for independent per-chunk streams.
const SURFACE_TAG: i64 = 9871;
const VEIN_TAG: i64 = 39811;
const CAVE_TAG: i64 = 543321;
const CAVE_RADIUS_TAG: i64 = 76591;
const CAVE_DEPTH_TAG: i64 = 25981;
const FOREST_TAG: i64 = 88651;
const TREE_TAG: i64 = 14771;

/// Seed multiplier for the world-wide height noise.
const HEIGHT_NOISE_MUL: i64 = 9277;


/// Terrain generator for a world. Owns the world seed and the world-wide
/// height noise; everything else is derived per chunk.
pub struct MapGenerator {
    /// The world seed used as a base for chunk seeding.
    seed: i64,
    /// Height noise, shared by all chunks: columns are sampled in world
    /// space, so the stream must not depend on the chunk id.
    height_noise: NoiseGenerator,
}

impl MapGenerator {

    /// Create a new generator given a world seed.
    pub fn new(seed: i64) -> Self {
        Self {
            height_noise: NoiseGenerator::new(
                seed.wrapping_mul(HEIGHT_NOISE_MUL),
                HEIGHT_AMPLITUDE, 0.015, 4, 0.5, 2.0),
            seed,
        }
    }

    #[inline]
    pub fn seed(&self) -> i64 {
        self.seed
    }

    /// Seed of the per-chunk random stream, a pure function of (seed, id).
    #[inline]
    fn chunk_seed(&self, id: i32) -> i64 {
        self.seed ^ (id as i64).wrapping_mul(CHUNK_SEED_MUL)
    }

    /// Seed of an independent stream for one sub-feature of one chunk.
    #[inline]
    fn feature_seed(&self, id: i32, tag: i64, index: i32) -> i64 {
        self.chunk_seed(id) ^ tag.wrapping_add((index as i64).wrapping_mul(FEATURE_INDEX_MUL))
    }

    /// Generate the baseline chunk for the given id.
    ///
    /// The pipeline is ordered: land shape, ocean fill, then biome surface
    /// dressing, ore veins, caves and trees. When no biome matches the
    /// chunk's environment key the last four steps are skipped and the
    /// chunk is pure land and ocean; this is not an error.
    pub fn generate_chunk(&self, id: i32) -> Chunk {

        let mut chunk = Chunk::new(id);

        let heights = self.gen_land(id, &mut chunk);
        self.gen_ocean(&mut chunk);

        let height_category = Self::height_category(&heights);
        match biome::get(height_category, TEMPERATURE, HUMIDITY) {
            Some(biome) => {
                chunk.set_biome(Some((height_category, TEMPERATURE, HUMIDITY)));
                self.gen_surface(id, &mut chunk, biome, &heights);
                self.gen_veins(id, &mut chunk, biome);
                self.gen_caves(id, &mut chunk);
                self.gen_trees(id, &mut chunk, biome);
            }
            None => {
                trace!("no biome for chunk {id} (height category {height_category}), land and ocean only");
            }
        }

        chunk

    }

    /// Step 1: raw stone height field from the height noise. Returns the
    /// per-column stone heights for the later steps.
    fn gen_land(&self, id: i32, chunk: &mut Chunk) -> [usize; CHUNK_WIDTH] {

        let mut heights = [0usize; CHUNK_WIDTH];

        for x in 0..CHUNK_WIDTH {

            // Widened so columns of extreme chunk ids sample in world
            // space without overflowing.
            let position = x as i64 + id as i64 * CHUNK_WIDTH as i64;
            let height = (BASE_HEIGHT + self.height_noise.generate(position)).round() as i32;
            let height = height.clamp(1, CHUNK_HEIGHT as i32) as usize;

            for y in 0..height {
                chunk.set_block(chunk::calc_index(x, y), block::STONE);
            }

            heights[x] = height;

        }

        heights

    }

    /// Discrete height category of the chunk, from the mean column height,
    /// used for biome selection.
    fn height_category(heights: &[usize; CHUNK_WIDTH]) -> u8 {
        let mean = heights.iter().sum::<usize>() / CHUNK_WIDTH;
        (mean / 32).min(3) as u8
    }

    /// Step 2: flood air below sea level, never overwriting stone.
    fn gen_ocean(&self, chunk: &mut Chunk) {
        for x in 0..CHUNK_WIDTH {
            for y in 0..SEA_LEVEL {
                let index = chunk::calc_index(x, y);
                if chunk.get_block(index) == block::AIR {
                    chunk.set_block(index, block::WATER);
                }
            }
        }
    }

    /// Step 3: biome surface dressing. Each column is walked downward from
    /// its terrain top, replacing bounded runs of stone with the biome's
    /// zone blocks in declared order.
    fn gen_surface(&self, id: i32, chunk: &mut Chunk, biome: &Biome, heights: &[usize; CHUNK_WIDTH]) {

        let mut rand = WorldRandom::new(self.feature_seed(id, SURFACE_TAG, 0));

        for x in 0..CHUNK_WIDTH {

            let mut last = heights[x] as i32;

            for zone in &biome.surface_zones {

                // The zone only applies while the running threshold has not
                // dropped below its minimum.
                if last < zone.min_height {
                    continue;
                }

                let jitter = rand.next_int_bounded(3) - 1;
                let stop = i32::max(zone.min_height + jitter, last - zone.max_extent)
                    .clamp(0, last);

                for y in stop..last {
                    let index = chunk::calc_index(x, y as usize);
                    if chunk.get_block(index) == block::STONE {
                        chunk.set_block(index, zone.block);
                    }
                }

                last = stop;

            }

        }

    }

    /// Step 4: ore veins. The vein count is drawn from the biome's range,
    /// each vein picks its rule by weighted choice and flood-fills from a
    /// seed cell inside the rule's height band. Returns the number of
    /// placement attempts.
    fn gen_veins(&self, id: i32, chunk: &mut Chunk, biome: &Biome) -> u32 {

        let mut rand = WorldRandom::new(self.feature_seed(id, VEIN_TAG, 0));

        let (min, max) = biome.vein_qty;
        let count = rand.next_int_range(min as i32, max as i32);
        let weights: Vec<u32> = biome.veins.iter().map(|rule| rule.weight).collect();

        for _ in 0..count {
            let rule = &biome.veins[rand.next_weighted_index(&weights)];
            vein::generate(chunk, rule, &mut rand);
        }

        count as u32

    }

    /// Step 5: carve caves. Each cave instance gets independently seeded
    /// radius and depth noise streams derived from (seed, id, tag, index).
    fn gen_caves(&self, id: i32, chunk: &mut Chunk) {

        let mut rand = WorldRandom::new(self.feature_seed(id, CAVE_TAG, 0));
        let count = rand.next_int_bounded(3);

        for cave_index in 0..count {

            let radius_noise = NoiseGenerator::new(
                self.feature_seed(id, CAVE_RADIUS_TAG, cave_index),
                2.0, 0.3, 2, 0.5, 2.0);

            let depth_noise = NoiseGenerator::new(
                self.feature_seed(id, CAVE_DEPTH_TAG, cave_index),
                22.0, 0.1, 2, 0.5, 2.0);

            cave::generate(chunk, &radius_noise, &depth_noise, &mut rand);

        }

    }

    /// Base forest roll of a chunk, a pure function of (seed, id).
    fn forest_roll(&self, id: i32) -> f32 {
        WorldRandom::new(self.feature_seed(id, FOREST_TAG, 0)).next_float()
    }

    /// Step 6: vegetation, only for biomes with a tree descriptor.
    fn gen_trees(&self, id: i32, chunk: &mut Chunk, biome: &Biome) {

        let Some(rule) = &biome.tree else { return };

        // Forest state is spatially correlated by re-rolling the previous
        // chunk's own stream instead of carrying mutable state across
        // generation calls, which keeps chunks order-independent.
        let roll = self.forest_roll(id);
        let neighbor_forest = self.forest_roll(id.wrapping_sub(1)) < rule.forest_spawn_chance;
        let is_forest = roll < if neighbor_forest {
            rule.stay_forest_chance
        } else {
            rule.forest_spawn_chance
        };

        chunk.set_forest(is_forest);

        let chance = if is_forest { rule.forest_chance } else { rule.lone_chance };
        let mut rand = WorldRandom::new(self.feature_seed(id, TREE_TAG, 0));

        for x in 0..CHUNK_WIDTH {
            if rand.next_float() < chance {
                tree::generate(chunk, rule, x as i32, &mut rand);
            }
        }

    }

}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn deterministic() {
        let generator = MapGenerator::new(12345);
        let a = generator.generate_chunk(0);
        let b = generator.generate_chunk(0);
        assert_eq!(a.blocks(), b.blocks());
        assert_eq!(a.biome(), b.biome());
        assert_eq!(a.is_forest(), b.is_forest());
    }

    #[test]
    fn order_independent() {
        let generator = MapGenerator::new(12345);
        let first = generator.generate_chunk(5);
        // Generating other chunks in between must not affect the result.
        for id in -3..3 {
            generator.generate_chunk(id);
        }
        let second = generator.generate_chunk(5);
        assert_eq!(first.blocks(), second.blocks());
    }

    #[test]
    fn seed_dependent() {
        let a = MapGenerator::new(12345).generate_chunk(0);
        let b = MapGenerator::new(54321).generate_chunk(0);
        assert_ne!(a.blocks(), b.blocks());
    }

    #[test]
    fn extreme_chunk_ids_generate() {
        let generator = MapGenerator::new(12345);
        // Columns of the outermost chunks sample the height noise far
        // outside the i32 range, which must degrade, not abort.
        for id in [i32::MIN, i32::MIN / 2, i32::MAX / 2, i32::MAX] {
            let chunk = generator.generate_chunk(id);
            assert!(!chunk.has_diffs());
        }
    }

    #[test]
    fn baseline_has_no_diffs() {
        let generator = MapGenerator::new(12345);
        for id in -4..4 {
            assert!(!generator.generate_chunk(id).has_diffs());
        }
    }

    #[test]
    fn water_only_below_sea_level() {
        let generator = MapGenerator::new(12345);
        let mut any_water = false;
        for id in 0..16 {
            let chunk = generator.generate_chunk(id);
            for x in 0..CHUNK_WIDTH {
                for y in 0..CHUNK_HEIGHT {
                    if chunk.get_block(chunk::calc_index(x, y)) == block::WATER {
                        assert!(y < SEA_LEVEL, "water above sea level at ({x}, {y}) in chunk {id}");
                        any_water = true;
                    }
                }
            }
        }
        assert!(any_water, "no ocean found in any sampled chunk");
    }

    #[test]
    fn vein_count_within_biome_range() {

        let generator = MapGenerator::new(12345);
        let mut checked = 0;

        for id in -8..8 {

            let mut chunk = generator.generate_chunk(id);
            let Some((height, t, h)) = chunk.biome() else { continue };
            let biome = biome::get(height, t, h).unwrap();

            // Re-run the vein pass on the generated chunk: the attempt
            // count only depends on (seed, id), not on the chunk content.
            let attempts = generator.gen_veins(id, &mut chunk, biome);
            assert!(
                attempts >= biome.vein_qty.0 && attempts <= biome.vein_qty.1,
                "{attempts} vein attempts in chunk {id}, expected {:?}", biome.vein_qty);

            checked += 1;

        }

        assert!(checked > 0, "no biome chunk in the sampled range");

    }

    /// Every ore cell must belong to a 4-connected component of its block
    /// type that touches the declared height band of a matching vein rule.
    #[test]
    fn vein_containment() {

        let generator = MapGenerator::new(12345);

        for id in -8..8 {

            let chunk = generator.generate_chunk(id);
            let Some((height, t, h)) = chunk.biome() else { continue };
            let biome = biome::get(height, t, h).unwrap();

            let ore_blocks: Vec<u8> = biome.veins.iter().map(|rule| rule.block).collect();
            let mut visited = [false; chunk::CHUNK_SIZE];

            for x in 0..CHUNK_WIDTH as i32 {
                for y in 0..CHUNK_HEIGHT as i32 {

                    let index = chunk::calc_index(x as usize, y as usize);
                    let id_block = chunk.get_block(index);
                    if visited[index] || !ore_blocks.contains(&id_block) {
                        continue;
                    }

                    // Flood the component and check it intersects a band.
                    let mut stack = vec![(x, y)];
                    let mut in_band = false;
                    visited[index] = true;

                    while let Some((cx, cy)) = stack.pop() {
                        for rule in &biome.veins {
                            if rule.block == id_block && cy >= rule.min_height && cy <= rule.max_height {
                                in_band = true;
                            }
                        }
                        for (nx, ny) in [(cx - 1, cy), (cx + 1, cy), (cx, cy - 1), (cx, cy + 1)] {
                            if nx < 0 || nx >= CHUNK_WIDTH as i32 || ny < 0 || ny >= CHUNK_HEIGHT as i32 {
                                continue;
                            }
                            let n_index = chunk::calc_index(nx as usize, ny as usize);
                            if !visited[n_index] && chunk.get_block(n_index) == id_block {
                                visited[n_index] = true;
                                stack.push((nx, ny));
                            }
                        }
                    }

                    assert!(in_band, "orphan {} component in chunk {id}", block::name(id_block));

                }
            }

        }

    }

    /// Every placed leaf must be 4-adjacent to a trunk or leaf cell.
    #[test]
    fn leaf_adjacency() {

        let generator = MapGenerator::new(12345);
        let mut any_tree = false;

        for id in -32..32 {

            let chunk = generator.generate_chunk(id);

            for x in 0..CHUNK_WIDTH as i32 {
                for y in 0..CHUNK_HEIGHT as i32 {

                    let index = chunk::calc_index(x as usize, y as usize);
                    match chunk.get_block(index) {
                        block::LOG => any_tree = true,
                        block::LEAVES => {
                            let adjacent = [(x - 1, y), (x + 1, y), (x, y - 1), (x, y + 1)]
                                .into_iter()
                                .filter(|&(nx, ny)| {
                                    nx >= 0 && nx < CHUNK_WIDTH as i32
                                        && ny >= 0 && ny < CHUNK_HEIGHT as i32
                                })
                                .any(|(nx, ny)| {
                                    let b = chunk.get_block(chunk::calc_index(nx as usize, ny as usize));
                                    b == block::LOG || b == block::LEAVES
                                });
                            assert!(adjacent, "floating leaf at ({x}, {y}) in chunk {id}");
                        }
                        _ => {}
                    }

                }
            }

        }

        assert!(any_tree, "no tree generated in any sampled chunk");

    }

}
