//! Append-only durable store of confirmed proxies, one `host:port` per line

use crate::error::HarvestError;
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Durable backing for the registry
///
/// The harvester is the only writer. Appends are issued in coordinator
/// order and made durable by a single `sync` per cycle.
pub trait ProxyStore: Send {
    /// Every key currently recorded
    fn load(&mut self) -> Result<Vec<String>, HarvestError>;

    /// Append one confirmed key
    fn append(&mut self, key: &str) -> Result<(), HarvestError>;

    /// Flush appended keys to stable storage
    fn sync(&mut self) -> Result<(), HarvestError>;
}

/// Plain-text file store
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    file: File,
}

impl FileStore {
    /// Open (creating if needed) the store at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, HarvestError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(&path)
            .map_err(|source| HarvestError::StoreOpen {
                path: path.clone(),
                source,
            })?;

        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_keys(&mut self) -> io::Result<Vec<String>> {
        self.file.seek(SeekFrom::Start(0))?;
        let mut keys = Vec::new();
        for line in BufReader::new(&self.file).lines() {
            let line = line?;
            let key = line.trim();
            if !key.is_empty() {
                keys.push(key.to_string());
            }
        }
        Ok(keys)
    }
}

impl ProxyStore for FileStore {
    fn load(&mut self) -> Result<Vec<String>, HarvestError> {
        self.read_keys().map_err(|source| HarvestError::StoreOpen {
            path: self.path.clone(),
            source,
        })
    }

    fn append(&mut self, key: &str) -> Result<(), HarvestError> {
        writeln!(self.file, "{}", key).map_err(|source| HarvestError::PersistenceWrite {
            key: key.to_string(),
            source,
        })
    }

    fn sync(&mut self) -> Result<(), HarvestError> {
        self.file
            .sync_all()
            .map_err(|source| HarvestError::PersistenceWrite {
                key: self.path.display().to_string(),
                source,
            })
    }
}
