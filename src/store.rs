//! One-file-per-paste storage with lazy expiration.
//!
//! Each paste lives in `<dir>/<id>.txt`:
//!
//! ```text
//! <marker>\n<content>\n
//! ```
//!
//! Everything after the first newline, minus the final newline, is the
//! content, so multi-line pastes survive a round trip. Records are never
//! rewritten after creation. Expired and consumed records are removed by the
//! read that discovers them; [`PasteStore::sweep`] is an optional extra pass
//! over absolute expiries only.
//!
//! There is no locking. Two writers of identical content produce identical
//! records; two readers of a burn paste inside its grace window both see it.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use crate::error::{Error, Result};
use crate::expiration::{self, Marker, Outcome, Policy};
use crate::id;

const EXTENSION: &str = "txt";

/// A paste as served to a reader.
#[derive(Clone, Debug)]
pub struct Paste {
    pub id: String,
    pub content: Vec<u8>,
    pub marker: Marker,
    /// `false` only on the read that consumed a burn-after-reading paste.
    pub keep_alive: bool,
    pub burn_after_reading: bool,
    /// Humanized countdown, for pastes with an absolute expiry.
    pub expiration: Option<String>,
}

impl Paste {
    pub fn content_lossy(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.content)
    }
}

/// The paste directory.
#[derive(Debug)]
pub struct PasteStore {
    dir: PathBuf,
}

impl PasteStore {
    /// Opens (creating if needed) the paste directory at `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(Error::Persistence)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Stores `content` under its derived identifier and returns the id.
    ///
    /// Identical content overwrites the existing record.
    pub fn create(&self, content: &[u8], policy: Option<Policy>) -> Result<String> {
        self.create_at(content, policy, Utc::now())
    }

    pub fn create_at(&self, content: &[u8], policy: Option<Policy>, now: DateTime<Utc>) -> Result<String> {
        let id = id::derive(content);
        let marker = Marker::new(policy, now);

        let mut record = marker.to_string().into_bytes();
        record.reserve(content.len() + 2);
        record.push(b'\n');
        record.extend_from_slice(content);
        record.push(b'\n');

        self.write_atomic(&id, &record).map_err(|e| {
            error!(id = %id, "could not save paste: {e}");
            Error::Persistence(e)
        })?;

        info!(id = %id, marker = %marker, bytes = content.len(), "paste created");
        Ok(id)
    }

    /// Loads the paste `id`, deleting it if it has expired or this read
    /// consumes it.
    pub fn get(&self, id: &str) -> Result<Paste> {
        self.get_at(id, Utc::now())
    }

    pub fn get_at(&self, id: &str, now: DateTime<Utc>) -> Result<Paste> {
        if !id::is_valid(id) {
            debug!(id, "rejected invalid paste id");
            return Err(Error::InvalidIdentifier);
        }

        let raw = match fs::read(self.path_for(id)) {
            Ok(raw) => raw,
            Err(e) => {
                debug!(id, "paste load failed: {e}");
                return Err(Error::NotFound);
            }
        };
        let (marker, content) = decode(&raw);

        let mut paste = Paste {
            id: id.to_owned(),
            content,
            burn_after_reading: marker.is_burn_after_reading(),
            marker,
            keep_alive: true,
            expiration: None,
        };

        match expiration::evaluate(&paste.marker, now) {
            Outcome::Expired => {
                if let Err(e) = self.delete(id) {
                    error!(id, "could not delete expired paste: {e}");
                }
                info!(id, "paste expired");
                Err(Error::NotFound)
            }
            Outcome::BurnConsumed => {
                self.delete(id)?;
                info!(id, "paste burned after reading");
                paste.keep_alive = false;
                Ok(paste)
            }
            Outcome::BurnPending => Ok(paste),
            Outcome::Fresh { remaining, expiry } => {
                paste.expiration = Some(expiration::humanize(remaining, expiry));
                Ok(paste)
            }
        }
    }

    /// Removes the record for `id`. A missing record is not an error.
    pub fn delete(&self, id: &str) -> Result<()> {
        if !id::is_valid(id) {
            return Err(Error::InvalidIdentifier);
        }
        match fs::remove_file(self.path_for(id)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::Persistence(e)),
        }
    }

    /// Deletes every record whose absolute expiry has passed at `now`.
    ///
    /// Burn-after-reading records are left alone: an unread burn paste has
    /// not been consumed. Returns the number of records removed.
    pub fn sweep(&self, now: DateTime<Utc>) -> Result<usize> {
        let mut removed = 0;
        for entry in fs::read_dir(&self.dir).map_err(Error::Persistence)? {
            let path = match entry {
                Ok(entry) => entry.path(),
                Err(e) => {
                    warn!("sweep: unreadable directory entry: {e}");
                    continue;
                }
            };
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            let Some(id) = path.file_stem().and_then(|s| s.to_str()) else { continue };
            if !id::is_valid(id) {
                continue;
            }

            let raw = match fs::read(&path) {
                Ok(raw) => raw,
                Err(e) => {
                    warn!(id, "sweep: could not read paste: {e}");
                    continue;
                }
            };
            let (marker, _) = decode(&raw);
            if expiration::evaluate(&marker, now) == Outcome::Expired {
                match self.delete(id) {
                    Ok(()) => removed += 1,
                    Err(e) => warn!(id, "sweep: could not delete paste: {e}"),
                }
            }
        }
        Ok(removed)
    }

    fn path_for(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{id}.{EXTENSION}"))
    }

    /// Writes to a scratch file and renames it over the record, so readers
    /// never observe a half-written paste.
    fn write_atomic(&self, id: &str, bytes: &[u8]) -> io::Result<()> {
        static SEQ: AtomicU64 = AtomicU64::new(0);
        let seq = SEQ.fetch_add(1, Ordering::Relaxed);
        let tmp = self.dir.join(format!(".{id}.{}.{seq}.tmp", std::process::id()));

        let mut opts = OpenOptions::new();
        opts.write(true).create_new(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            opts.mode(0o600);
        }

        let written = opts.open(&tmp).and_then(|mut file| file.write_all(bytes));
        if let Err(e) = written.and_then(|()| fs::rename(&tmp, self.path_for(id))) {
            let _ = fs::remove_file(&tmp);
            return Err(e);
        }
        Ok(())
    }
}

/// Splits a record into its marker and content.
fn decode(raw: &[u8]) -> (Marker, Vec<u8>) {
    let (head, body) = match raw.iter().position(|&b| b == b'\n') {
        Some(nl) => (&raw[..nl], &raw[nl + 1..]),
        None => (raw, &[][..]),
    };
    let body = body.strip_suffix(b"\n").unwrap_or(body);
    (Marker::parse(&String::from_utf8_lossy(head)), body.to_vec())
}
