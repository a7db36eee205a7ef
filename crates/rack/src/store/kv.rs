//! The external KV-engine contract (spec §6) and a `sled`-backed default
//! implementation. `rack` treats the engine as a byte-keyed mapping with
//! atomic single-key writes; it does not assume transactions.

use crate::error::RackError;

pub trait KvEngine: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, RackError>;
    fn put(&self, key: &str, value: &[u8]) -> Result<(), RackError>;
    fn delete(&self, key: &str) -> Result<(), RackError>;

    /// Insertion-ordered if the engine can provide it; `sled` cannot (its
    /// iteration order is lexicographic by key), so `SledEngine` returns
    /// key-sorted order here, which is why `Store::sort` is a no-op over
    /// it (spec §4.7, §9).
    fn iter_keys(&self) -> Result<Vec<String>, RackError>;

    fn close(&self) -> Result<(), RackError>;
}

///
/// SledEngine
///
/// Default `KvEngine` backed by a `sled` database file.
///

pub struct SledEngine {
    db: sled::Db,
}

impl SledEngine {
    pub fn open(path: &std::path::Path, wipe: bool) -> Result<Self, RackError> {
        if wipe && path.exists() {
            if path.is_dir() {
                std::fs::remove_dir_all(path)?;
            } else {
                std::fs::remove_file(path)?;
            }
        }
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    #[cfg(any(test, feature = "test-util"))]
    pub fn temporary() -> Self {
        Self {
            db: sled::Config::new().temporary(true).open().expect("open temp sled db"),
        }
    }
}

impl KvEngine for SledEngine {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, RackError> {
        Ok(self.db.get(key)?.map(|v| v.to_vec()))
    }

    fn put(&self, key: &str, value: &[u8]) -> Result<(), RackError> {
        self.db.insert(key, value)?;
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), RackError> {
        self.db.remove(key)?;
        Ok(())
    }

    fn iter_keys(&self) -> Result<Vec<String>, RackError> {
        let mut keys = Vec::new();
        for item in self.db.iter() {
            let (k, _) = item?;
            if let Ok(s) = String::from_utf8(k.to_vec()) {
                keys.push(s);
            }
        }
        Ok(keys)
    }

    fn close(&self) -> Result<(), RackError> {
        self.db.flush()?;
        Ok(())
    }
}
