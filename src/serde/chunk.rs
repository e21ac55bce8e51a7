//! Chunk record serialization and deserialization.
//!
//! Two schemes coexist: the current one stores only the diff set of a
//! chunk (`{"diffs": {"<flat_index>": <block>, ...}, "version": 0.4}`),
//! the legacy one (version <= 0.3) stores a full chunk snapshot. Readers
//! branch on `version`.

use std::collections::BTreeMap;
use std::io::{Read, Write};

use serde::{Deserialize, Serialize};

use crate::chunk::{CHUNK_SIZE, Chunk};
use crate::biome::EnvKey;


/// Version written for new records.
pub const CURRENT_VERSION: f32 = 0.4;
/// Records up to this version are legacy full snapshots.
pub const LEGACY_VERSION: f32 = 0.3;


/// A decoded chunk record.
#[derive(Debug, Clone, PartialEq)]
pub enum StoredChunk {
    /// Current scheme: deviations from the deterministic baseline, to be
    /// replayed on top of a freshly generated chunk.
    Diffs(Vec<(usize, u8)>),
    /// Legacy scheme: a full snapshot. The biome is reconstructed by table
    /// lookup on the stored key and `blocks` replaces the baseline.
    Legacy {
        biome: EnvKey,
        is_forest: bool,
        blocks: Vec<u8>,
    },
}

/// Raw JSON shape shared by both schemes.
#[derive(Debug, Serialize, Deserialize)]
struct RawRecord {
    version: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    diffs: Option<BTreeMap<String, u8>>,
    // Legacy-only fields; `direction` is carried by old records but has no
    // meaning for terrain reconstruction.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    direction: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    biome: Option<EnvKey>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    is_forest: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    blocks: Option<Vec<u8>>,
}

/// Read a chunk record from the given reader, branching on its version.
pub fn from_reader(reader: impl Read) -> Result<StoredChunk, RecordError> {

    let raw: RawRecord = serde_json::from_reader(reader)?;

    if raw.version <= LEGACY_VERSION {

        let biome = raw.biome.ok_or(RecordError::MissingField("biome"))?;
        let blocks = raw.blocks.ok_or(RecordError::MissingField("blocks"))?;
        if blocks.len() != CHUNK_SIZE {
            return Err(RecordError::InvalidBlockCount(blocks.len()));
        }

        Ok(StoredChunk::Legacy {
            biome,
            is_forest: raw.is_forest.unwrap_or(false),
            blocks,
        })

    } else {

        let diffs = raw.diffs.ok_or(RecordError::MissingField("diffs"))?;
        let mut decoded = Vec::with_capacity(diffs.len());

        for (key, block) in diffs {
            let index: usize = key.parse().map_err(|_| RecordError::InvalidIndex(key.clone()))?;
            if index >= CHUNK_SIZE {
                return Err(RecordError::InvalidIndex(key));
            }
            decoded.push((index, block));
        }

        Ok(StoredChunk::Diffs(decoded))

    }

}

/// Write the current scheme record for a chunk: only its diff set.
pub fn to_writer(writer: impl Write, chunk: &Chunk) -> Result<(), RecordError> {

    let diffs: BTreeMap<String, u8> = chunk.diffs()
        .map(|(index, block)| (index.to_string(), block))
        .collect();

    let raw = RawRecord {
        version: CURRENT_VERSION,
        diffs: Some(diffs),
        direction: None,
        biome: None,
        is_forest: None,
        blocks: None,
    };

    serde_json::to_writer(writer, &raw)?;
    Ok(())

}

/// Error type for chunk record encoding and decoding.
#[derive(thiserror::Error, Debug)]
pub enum RecordError {
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("missing field: {0}")]
    MissingField(&'static str),
    #[error("invalid diff index: {0}")]
    InvalidIndex(String),
    #[error("invalid block count: {0}")]
    InvalidBlockCount(usize),
}
