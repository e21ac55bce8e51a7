//! Biome registry: declarative rulesets controlling surface materials, ore
//! distribution and vegetation for a category of terrain, selected by an
//! environment key.

use once_cell::sync::Lazy;

use crate::block;


/// Environment key selecting a biome: (height, temperature, humidity)
/// categories. Temperature and humidity are fixed to 1 by the generator,
/// only the height category varies in practice; this is a known
/// simplification of the environment model, not a bug.
pub type EnvKey = (u8, u8, u8);

/// Fixed temperature category used during generation.
pub const TEMPERATURE: u8 = 1;
/// Fixed humidity category used during generation.
pub const HUMIDITY: u8 = 1;


/// A surface zone: how deep one material replaces stone beneath the
/// terrain top. Zones are applied in declared order, top material first.
#[derive(Debug, Clone, Copy)]
pub struct SurfaceZone {
    pub block: u8,
    /// Minimum baseline height the zone applies at.
    pub min_height: i32,
    /// Maximum vertical extent of the zone run.
    pub max_extent: i32,
}

/// An ore vein placement rule.
#[derive(Debug, Clone, Copy)]
pub struct VeinRule {
    /// Selection weight relative to the other rules of the biome.
    pub weight: u32,
    pub block: u8,
    /// Inclusive height band the vein seed cell is picked in.
    pub min_height: i32,
    pub max_height: i32,
    /// Per-cell continuation probability of the flood fill.
    pub expand_chance: f32,
}

/// Vegetation descriptor of a biome.
#[derive(Debug, Clone, Copy)]
pub struct TreeRule {
    pub trunk: u8,
    pub leaves: u8,
    /// Block the tree may grow into, normally air.
    pub grows_in: u8,
    /// Surface block required for a tree to spawn on a column.
    pub surface: u8,
    /// Block the surface cell is converted to when the tree roots.
    pub sub_surface: u8,
    /// Inclusive trunk height range.
    pub min_trunk: i32,
    pub max_trunk: i32,
    /// Inclusive canopy height range of a leaf column.
    pub min_leaves_height: i32,
    pub max_leaves_height: i32,
    /// Inclusive lateral canopy width range, per side.
    pub min_leaves_width: i32,
    pub max_leaves_width: i32,
    /// Per-column spawn probability outside forests.
    pub lone_chance: f32,
    /// Per-column spawn probability inside forests.
    pub forest_chance: f32,
    /// Probability for a chunk to start a forest.
    pub forest_spawn_chance: f32,
    /// Probability for a forest to extend into the next chunk.
    pub stay_forest_chance: f32,
}

/// Immutable biome configuration.
#[derive(Debug, Clone)]
pub struct Biome {
    pub name: &'static str,
    pub surface_zones: Vec<SurfaceZone>,
    /// Inclusive min/max count of ore veins placed per chunk.
    pub vein_qty: (u32, u32),
    pub veins: Vec<VeinRule>,
    pub tree: Option<TreeRule>,
}

const OAK: TreeRule = TreeRule {
    trunk: block::LOG,
    leaves: block::LEAVES,
    grows_in: block::AIR,
    surface: block::GRASS,
    sub_surface: block::DIRT,
    min_trunk: 3,
    max_trunk: 6,
    min_leaves_height: 1,
    max_leaves_height: 3,
    min_leaves_width: 1,
    max_leaves_width: 2,
    lone_chance: 0.05,
    forest_chance: 0.25,
    forest_spawn_chance: 0.15,
    stay_forest_chance: 0.6,
};

// The table is declarative and stable across process restarts: persisted
// chunks reference biomes by environment key. Height category 0 has no
// entry on purpose, those chunks are pure land and ocean.
static TABLE: Lazy<Vec<(EnvKey, Biome)>> = Lazy::new(|| vec![
    ((1, 1, 1), Biome {
        name: "coast",
        surface_zones: vec![
            SurfaceZone { block: block::SAND, min_height: 30, max_extent: 5 },
        ],
        vein_qty: (2, 5),
        veins: vec![
            VeinRule { weight: 5, block: block::COAL_ORE, min_height: 10, max_height: 40, expand_chance: 0.45 },
            VeinRule { weight: 2, block: block::IRON_ORE, min_height: 5, max_height: 30, expand_chance: 0.4 },
        ],
        tree: None,
    }),
    ((2, 1, 1), Biome {
        name: "plains",
        surface_zones: vec![
            SurfaceZone { block: block::GRASS, min_height: 50, max_extent: 1 },
            SurfaceZone { block: block::DIRT, min_height: 45, max_extent: 4 },
        ],
        vein_qty: (3, 6),
        veins: vec![
            VeinRule { weight: 10, block: block::COAL_ORE, min_height: 10, max_height: 50, expand_chance: 0.5 },
            VeinRule { weight: 5, block: block::IRON_ORE, min_height: 5, max_height: 40, expand_chance: 0.45 },
            VeinRule { weight: 1, block: block::GOLD_ORE, min_height: 5, max_height: 20, expand_chance: 0.4 },
        ],
        tree: Some(OAK),
    }),
    ((3, 1, 1), Biome {
        name: "mountains",
        surface_zones: vec![
            SurfaceZone { block: block::SNOW, min_height: 88, max_extent: 2 },
            SurfaceZone { block: block::DIRT, min_height: 60, max_extent: 3 },
        ],
        vein_qty: (4, 8),
        veins: vec![
            VeinRule { weight: 8, block: block::COAL_ORE, min_height: 10, max_height: 70, expand_chance: 0.5 },
            VeinRule { weight: 6, block: block::IRON_ORE, min_height: 5, max_height: 50, expand_chance: 0.45 },
            VeinRule { weight: 3, block: block::GOLD_ORE, min_height: 5, max_height: 30, expand_chance: 0.4 },
            VeinRule { weight: 1, block: block::DIAMOND_ORE, min_height: 2, max_height: 16, expand_chance: 0.35 },
        ],
        tree: None,
    }),
]);

/// Look up the biome for an environment key. A miss is an expected
/// condition: the caller skips surface dressing and keeps generating.
pub fn get(height: u8, temperature: u8, humidity: u8) -> Option<&'static Biome> {
    TABLE.iter()
        .find(|&&(key, _)| key == (height, temperature, humidity))
        .map(|(_, biome)| biome)
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn lookup() {
        assert!(get(0, 1, 1).is_none());
        assert_eq!(get(1, 1, 1).unwrap().name, "coast");
        assert_eq!(get(2, 1, 1).unwrap().name, "plains");
        assert_eq!(get(3, 1, 1).unwrap().name, "mountains");
        assert!(get(2, 0, 1).is_none());
    }

    #[test]
    fn plains_tree() {
        let tree = get(2, 1, 1).unwrap().tree.unwrap();
        assert_eq!(tree.surface, block::GRASS);
        assert_eq!(tree.grows_in, block::AIR);
        assert!(tree.min_trunk <= tree.max_trunk);
    }

}
