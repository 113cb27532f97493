//! Thin wrapper around an on-disk LevelDB database.

use crate::{Datum, RecordError};
use rusty_leveldb::{LdbIterator, Options, WriteBatch, DB};
use std::fs;
use std::path::{Path, PathBuf};

/// One decoded record.
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    pub key: String,
    pub datum: Datum,
}

/// Pending writes that become visible together on [`RecordStore::commit`].
pub struct RecordBatch {
    inner: WriteBatch,
    len: usize,
}

impl RecordBatch {
    pub fn new() -> Self {
        Self {
            inner: WriteBatch::default(),
            len: 0,
        }
    }

    pub fn put(&mut self, key: &str, value: &[u8]) {
        self.inner.put(key.as_bytes(), value);
        self.len += 1;
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Default for RecordBatch {
    fn default() -> Self {
        Self::new()
    }
}

/// An ordered key -> serialized `Datum` store.
pub struct RecordStore {
    db: DB,
    path: PathBuf,
}

impl RecordStore {
    /// Create an empty store at `path`, deleting whatever was there before.
    ///
    /// A store is therefore either freshly created or absent; records from a
    /// previous run never survive into the next one.
    pub fn create(path: impl AsRef<Path>) -> Result<Self, RecordError> {
        let path = path.as_ref().to_path_buf();
        if path.exists() {
            fs::remove_dir_all(&path)?;
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut opt = Options::default();
        opt.create_if_missing = true;
        let db = DB::open(&path, opt).map_err(|e| store_error(&path, e))?;
        Ok(Self { db, path })
    }

    /// Open an existing store for reading.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, RecordError> {
        let path = path.as_ref().to_path_buf();
        if !path.is_dir() {
            return Err(RecordError::MissingStore(path));
        }
        let mut opt = Options::default();
        opt.create_if_missing = false;
        let db = DB::open(&path, opt).map_err(|e| store_error(&path, e))?;
        Ok(Self { db, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Atomically apply a batch of writes.
    pub fn commit(&mut self, batch: RecordBatch) -> Result<(), RecordError> {
        if batch.is_empty() {
            return Ok(());
        }
        self.db
            .write(batch.inner, false)
            .map_err(|e| store_error(&self.path, e))
    }

    /// Flush the in-memory table to disk.
    pub fn flush(&mut self) -> Result<(), RecordError> {
        self.db.flush().map_err(|e| store_error(&self.path, e))
    }

    /// Every `(key, value)` pair in key order, undecoded.
    pub fn raw_entries(&mut self) -> Result<Vec<(String, Vec<u8>)>, RecordError> {
        let mut iter = self.db.new_iter().map_err(|e| store_error(&self.path, e))?;
        let mut out = Vec::new();
        let (mut key, mut value) = (Vec::new(), Vec::new());
        while iter.advance() {
            if !iter.current(&mut key, &mut value) {
                break;
            }
            out.push((String::from_utf8_lossy(&key).into_owned(), value.clone()));
        }
        Ok(out)
    }

    /// Every record in key order, decoded.
    pub fn records(&mut self) -> Result<Vec<Record>, RecordError> {
        self.raw_entries()?
            .into_iter()
            .map(|(key, value)| {
                Ok(Record {
                    key,
                    datum: Datum::from_bytes(&value)?,
                })
            })
            .collect()
    }

    /// Look up a single record.
    pub fn get(&mut self, key: &str) -> Result<Option<Datum>, RecordError> {
        match self.db.get(key.as_bytes()) {
            Some(value) => Ok(Some(Datum::from_bytes(&value)?)),
            None => Ok(None),
        }
    }
}

fn store_error(path: &Path, status: rusty_leveldb::Status) -> RecordError {
    RecordError::Store {
        path: path.to_path_buf(),
        message: status.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloudless_core::Target;
    use image::RgbImage;

    #[test]
    fn create_wipes_previous_contents() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("store");
        let datum = Datum::from_rgb(&RgbImage::new(2, 2), Target::Cloud);

        {
            let mut store = RecordStore::create(&path).expect("create");
            let mut batch = RecordBatch::new();
            batch.put("00000000", &datum.to_bytes());
            batch.put("00000001", &datum.to_bytes());
            store.commit(batch).expect("commit");
        }
        {
            let mut store = RecordStore::create(&path).expect("recreate");
            let mut batch = RecordBatch::new();
            batch.put("00000000", &datum.to_bytes());
            store.commit(batch).expect("commit");
        }

        let mut store = RecordStore::open(&path).expect("open");
        let keys: Vec<String> = store
            .raw_entries()
            .expect("entries")
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        assert_eq!(keys, vec!["00000000".to_string()]);
        assert_eq!(store.get("00000001").expect("get"), None);
    }

    #[test]
    fn batches_apply_together_and_empty_ones_are_skipped() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut store = RecordStore::create(dir.path().join("store")).expect("create");
        let datum = Datum::from_rgb(&RgbImage::new(1, 1), Target::Clear);

        let empty = RecordBatch::default();
        assert!(empty.is_empty());
        store.commit(empty).expect("empty commit");
        assert!(store.raw_entries().expect("entries").is_empty());

        let mut batch = RecordBatch::default();
        for key in ["00000002", "00000000", "00000001"] {
            batch.put(key, &datum.to_bytes());
        }
        assert_eq!(batch.len(), 3);
        store.commit(batch).expect("commit");
        store.flush().expect("flush");

        let records = store.records().expect("records");
        let keys: Vec<&str> = records.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, ["00000000", "00000001", "00000002"]);
        assert!(records.iter().all(|r| r.datum.target() == Target::Clear));
    }

    #[test]
    fn open_requires_an_existing_store() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(matches!(
            RecordStore::open(dir.path().join("nope")),
            Err(RecordError::MissingStore(_))
        ));
    }
}
