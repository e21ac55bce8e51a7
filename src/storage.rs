//! Durable chunk storage: the save manager seam and a directory-backed
//! implementation storing one JSON record per chunk id.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::PathBuf;

use tracing::warn;

use crate::serde::chunk::{self as record, RecordError, StoredChunk};
use crate::chunk::Chunk;


/// Durable storage of per-chunk diff records. The chunk manager only ever
/// calls this interface; implementations own their I/O discipline.
pub trait SaveManager {

    /// Load the stored record for a chunk id, `None` when nothing usable is
    /// stored. A corrupt record is treated as "no stored data" and logged,
    /// never as a fatal error: terrain regenerates from the seed, only the
    /// stored player edits are lost.
    fn load_chunk(&mut self, id: i32) -> Result<Option<StoredChunk>, StorageError>;

    /// Persist the diff set of a chunk.
    fn save_chunk(&mut self, chunk: &Chunk) -> Result<(), StorageError>;

}

/// Decode a raw record, degrading corruption to `None` with a warning.
fn decode_record(id: i32, reader: impl io::Read) -> Option<StoredChunk> {
    match record::from_reader(reader) {
        Ok(stored) => Some(stored),
        Err(err) => {
            warn!("corrupt record for chunk {id}, regenerating from baseline: {err}");
            None
        }
    }
}


/// Directory-backed save manager, one `chunk_<id>.json` record per chunk.
pub struct DirStorage {
    /// The directory containing the records, created lazily on first save.
    dir: PathBuf,
}

impl DirStorage {

    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn record_path(&self, id: i32) -> PathBuf {
        self.dir.join(format!("chunk_{id}.json"))
    }

}

impl SaveManager for DirStorage {

    fn load_chunk(&mut self, id: i32) -> Result<Option<StoredChunk>, StorageError> {

        let file = match File::open(self.record_path(id)) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(StorageError::Io(err)),
        };

        Ok(decode_record(id, BufReader::new(file)))

    }

    fn save_chunk(&mut self, chunk: &Chunk) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir)?;
        let mut writer = BufWriter::new(File::create(self.record_path(chunk.id()))?);
        record::to_writer(&mut writer, chunk)?;
        writer.flush()?;
        Ok(())
    }

}


/// In-memory save manager for tests and ephemeral worlds.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    records: HashMap<i32, Vec<u8>>,
}

impl MemoryStorage {

    pub fn new() -> Self {
        Self::default()
    }

    /// Install a raw record, bypassing the encoder. Useful to feed legacy
    /// or deliberately corrupt records.
    pub fn insert_record(&mut self, id: i32, record: Vec<u8>) {
        self.records.insert(id, record);
    }

}

impl SaveManager for MemoryStorage {

    fn load_chunk(&mut self, id: i32) -> Result<Option<StoredChunk>, StorageError> {
        match self.records.get(&id) {
            Some(bytes) => Ok(decode_record(id, bytes.as_slice())),
            None => Ok(None),
        }
    }

    fn save_chunk(&mut self, chunk: &Chunk) -> Result<(), StorageError> {
        let mut bytes = Vec::new();
        record::to_writer(&mut bytes, chunk)?;
        self.records.insert(chunk.id(), bytes);
        Ok(())
    }

}


/// Error type for save manager implementations.
#[derive(thiserror::Error, Debug)]
pub enum StorageError {
    #[error("io: {0}")]
    Io(#[from] io::Error),
    #[error("record: {0}")]
    Record(#[from] RecordError),
}

#[cfg(test)]
mod tests {

    use std::sync::atomic::{AtomicU32, Ordering};

    use crate::block;

    use super::*;

    /// Unique scratch directory per test.
    fn scratch_dir(name: &str) -> PathBuf {
        static COUNTER: AtomicU32 = AtomicU32::new(0);
        let count = COUNTER.fetch_add(1, Ordering::Relaxed);
        std::env::temp_dir().join(format!("strata_{name}_{}_{count}", std::process::id()))
    }

    #[test]
    fn dir_round_trip() {

        let dir = scratch_dir("round_trip");
        let mut storage = DirStorage::new(&dir);

        assert!(storage.load_chunk(3).unwrap().is_none());

        let mut chunk = Chunk::new(3);
        chunk.replace_block(50, block::AIR);
        storage.save_chunk(&chunk).unwrap();

        match storage.load_chunk(3).unwrap() {
            Some(StoredChunk::Diffs(diffs)) => assert_eq!(diffs, [(50, block::AIR)]),
            other => panic!("expected diffs record, got {other:?}"),
        }

        fs::remove_dir_all(&dir).unwrap();

    }

    #[test]
    fn dir_corrupt_record_degrades() {

        let dir = scratch_dir("corrupt");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("chunk_7.json"), b"{ definitely broken").unwrap();

        let mut storage = DirStorage::new(&dir);
        assert!(storage.load_chunk(7).unwrap().is_none());

        fs::remove_dir_all(&dir).unwrap();

    }

    #[test]
    fn memory_round_trip() {

        let mut storage = MemoryStorage::new();
        let mut chunk = Chunk::new(-2);
        chunk.replace_block(10, block::WATER);
        storage.save_chunk(&chunk).unwrap();

        match storage.load_chunk(-2).unwrap() {
            Some(StoredChunk::Diffs(diffs)) => assert_eq!(diffs, [(10, block::WATER)]),
            other => panic!("expected diffs record, got {other:?}"),
        }

    }

}
