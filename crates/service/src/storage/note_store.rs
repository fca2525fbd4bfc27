use std::{
    collections::{BTreeMap, HashMap},
    fmt,
    io::{self, Write},
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio::{fs, sync::Mutex};
use tracing::{debug, error, info, warn};

use crate::errors::ServiceError;

/// One stored note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub key: String,
    pub value: String,
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.key, self.value)
    }
}

/// Result of [`NoteStore::list`]. `Empty` is kept apart from an empty vector so
/// callers can render a dedicated empty-state reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Listing {
    Empty,
    Entries(Vec<Entry>),
}

/// What happened while loading the backing file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// File parsed; holds the number of entries read.
    Loaded(usize),
    /// File was missing and an empty one was written.
    Created,
    /// File could not be read or parsed; the store started empty.
    Recovered(String),
}

/// File-backed note store.
///
/// Holds a `key -> value` map behind a single mutex. Every mutation keeps the
/// lock while the whole map is rewritten to disk, so operations are linearized
/// and the file always holds a complete snapshot.
pub struct NoteStore {
    inner: Mutex<HashMap<String, String>>,
    file_path: PathBuf,
}

impl NoteStore {
    /// Load the store from `path`, logging and swallowing recoverable failures.
    pub async fn load<P: Into<PathBuf>>(path: P) -> Arc<Self> {
        Self::open(path).await.0
    }

    /// Load the store and report how the backing file was handled.
    ///
    /// A missing file is created with an empty object. An unreadable or
    /// corrupt file leaves the store empty in memory; the next write replaces it.
    pub async fn open<P: Into<PathBuf>>(path: P) -> (Arc<Self>, LoadOutcome) {
        let file_path = path.into();
        info!(path = %file_path.display(), "using storage file");
        if let Some(parent) = file_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.ok();
        }

        let (map, outcome) = match fs::read(&file_path).await {
            Ok(bytes) => match serde_json::from_slice::<HashMap<String, String>>(&bytes) {
                Ok(map) => {
                    info!(count = map.len(), path = %file_path.display(), "loaded entries");
                    let count = map.len();
                    (map, LoadOutcome::Loaded(count))
                }
                Err(e) => {
                    error!(
                        path = %file_path.display(),
                        error = %e,
                        "storage file is not valid JSON; starting EMPTY, its contents will be overwritten on the next write"
                    );
                    (HashMap::new(), LoadOutcome::Recovered(e.to_string()))
                }
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!(path = %file_path.display(), "storage file not found, creating an empty one");
                let empty = HashMap::new();
                match save(&file_path, &empty).await {
                    Ok(()) => (empty, LoadOutcome::Created),
                    Err(e) => {
                        error!(path = %file_path.display(), error = %e, "cannot create storage file");
                        (empty, LoadOutcome::Recovered(e.to_string()))
                    }
                }
            }
            Err(e) => {
                error!(path = %file_path.display(), error = %e, "cannot read storage file; starting EMPTY");
                (HashMap::new(), LoadOutcome::Recovered(e.to_string()))
            }
        };

        let store = Arc::new(Self { inner: Mutex::new(map), file_path });
        (store, outcome)
    }

    /// All entries sorted by key, or [`Listing::Empty`].
    pub async fn list(&self) -> Listing {
        let map = self.inner.lock().await;
        if map.is_empty() {
            return Listing::Empty;
        }
        let mut entries: Vec<Entry> = map
            .iter()
            .map(|(k, v)| Entry { key: k.clone(), value: v.clone() })
            .collect();
        entries.sort_by(|a, b| a.key.cmp(&b.key));
        Listing::Entries(entries)
    }

    /// Get value by key.
    pub async fn get(&self, key: &str) -> Option<String> {
        let map = self.inner.lock().await;
        map.get(key).cloned()
    }

    /// Insert or overwrite `key` and persist.
    ///
    /// When persisting fails the previous value is put back, so memory never
    /// runs ahead of the file.
    pub async fn add(&self, key: String, value: String) -> Result<(), ServiceError> {
        let mut map = self.inner.lock().await;
        debug!(%key, "add entry");
        let previous = map.insert(key.clone(), value);
        if let Err(e) = self.persist(&map).await {
            match previous {
                Some(old) => map.insert(key, old),
                None => map.remove(&key),
            };
            return Err(e);
        }
        Ok(())
    }

    /// Remove `key` and persist; echoes the key with whether it existed.
    pub async fn remove(&self, key: &str) -> Result<(String, bool), ServiceError> {
        let mut map = self.inner.lock().await;
        let Some(old) = map.remove(key) else {
            return Ok((key.to_string(), false));
        };
        debug!(%key, "removed entry");
        if let Err(e) = self.persist(&map).await {
            map.insert(key.to_string(), old);
            return Err(e);
        }
        Ok((key.to_string(), true))
    }

    /// Drop every entry and persist the empty map.
    pub async fn wipe(&self) -> Result<(), ServiceError> {
        let mut map = self.inner.lock().await;
        let previous = std::mem::take(&mut *map);
        if let Err(e) = self.persist(&map).await {
            *map = previous;
            return Err(e);
        }
        warn!(dropped = previous.len(), "store wiped");
        Ok(())
    }

    async fn persist(&self, map: &HashMap<String, String>) -> Result<(), ServiceError> {
        save(&self.file_path, map).await.map_err(|e| {
            error!(path = %self.file_path.display(), error = %e, "storage write failed twice");
            ServiceError::storage(&self.file_path, e)
        })
    }
}

/// Indented JSON with keys in order, so the file diffs cleanly.
fn encode(map: &HashMap<String, String>) -> io::Result<Vec<u8>> {
    let ordered: BTreeMap<&String, &String> = map.iter().collect();
    Ok(serde_json::to_vec_pretty(&ordered)?)
}

async fn save(path: &Path, map: &HashMap<String, String>) -> io::Result<()> {
    write_with_retry(path, encode(map)?, write_atomic).await
}

/// Run `write` on the blocking pool, retrying once before giving up.
async fn write_with_retry<W>(path: &Path, bytes: Vec<u8>, write: W) -> io::Result<()>
where
    W: Fn(&Path, &[u8]) -> io::Result<()> + Send + Sync + 'static,
{
    let job = Arc::new(WriteJob { path: path.to_path_buf(), bytes, write });
    let Err(first) = run_job(&job).await else {
        return Ok(());
    };
    warn!(path = %path.display(), error = %first, "storage write failed, retrying");
    run_job(&job).await
}

struct WriteJob<W> {
    path: PathBuf,
    bytes: Vec<u8>,
    write: W,
}

async fn run_job<W>(job: &Arc<WriteJob<W>>) -> io::Result<()>
where
    W: Fn(&Path, &[u8]) -> io::Result<()> + Send + Sync + 'static,
{
    let job = Arc::clone(job);
    tokio::task::spawn_blocking(move || (job.write)(job.path.as_path(), job.bytes.as_slice()))
        .await
        .unwrap_or_else(|e| Err(io::Error::other(e)))
}

/// Write into a uniquely named temp file beside `path`, fsync it, rename it
/// over `path`, then fsync the directory so the rename itself is durable.
/// Readers never observe a partial file.
fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut temp = tempfile::NamedTempFile::new_in(dir)?;
    temp.write_all(bytes)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;
    #[cfg(unix)]
    {
        if let Ok(dir) = std::fs::File::open(dir) {
            let _ = dir.sync_all();
        }
    }
    Ok(())
}
