//! Local file cache.
//!
//! One file per key under `<user-cache-dir>/<app>/<domain>/`. Each file is a
//! small JSON envelope holding the value and its expiry, so freshness never
//! depends on file timestamps. Writers are not synchronized; the last write
//! wins.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::{CacheError, Result};

type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

#[derive(Serialize, Deserialize)]
struct Envelope {
    /// base64 of the cached bytes
    value: String,
    expiry: DateTime<Utc>,
}

/// TTL cache of opaque byte values.
#[derive(Clone)]
pub struct FileCache {
    dir: PathBuf,
    now: Clock,
}

impl FileCache {
    /// Cache rooted at `<user-cache-dir>/<app>/<domain>`.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::NoCacheDir` if the platform has no cache directory.
    pub fn new(app: &str, domain: &str) -> Result<Self> {
        let base = dirs::cache_dir().ok_or(CacheError::NoCacheDir)?;
        Ok(Self::with_dir(base.join(app).join(domain)))
    }

    /// Cache rooted at an explicit directory.
    pub fn with_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            now: Arc::new(Utc::now),
        }
    }

    /// Replace the clock used for expiry checks.
    pub fn with_clock(mut self, now: impl Fn() -> DateTime<Utc> + Send + Sync + 'static) -> Self {
        self.now = Arc::new(now);
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Store `value` under `key` for `ttl` from now.
    pub fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<()> {
        let ttl = chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX);
        let expiry = (self.now)()
            .checked_add_signed(ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        self.set_until(key, value, expiry)
    }

    /// Store `value` under `key` until `expiry`.
    pub fn set_until(&self, key: &str, value: &[u8], expiry: DateTime<Utc>) -> Result<()> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.dir).map_err(CacheError::Io)?;

        let envelope = Envelope {
            value: STANDARD.encode(value),
            expiry,
        };
        let contents =
            serde_json::to_vec(&envelope).map_err(|e| CacheError::Corrupt(e.to_string()))?;
        write_private(&path, &contents)?;

        trace!(key, expiry = %expiry, "cache entry written");
        Ok(())
    }

    /// Fetch the value under `key`.
    ///
    /// # Errors
    ///
    /// `CacheError::NotFound` when absent, `CacheError::Expired` once
    /// `now > expiry`. Both are ordinary misses.
    pub fn get(&self, key: &str) -> Result<Vec<u8>> {
        let path = self.path_for(key)?;
        let contents = match fs::read(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(key, "cache miss: not found");
                return Err(CacheError::NotFound(key.to_string()).into());
            }
            Err(e) => return Err(CacheError::Io(e).into()),
        };

        let envelope: Envelope =
            serde_json::from_slice(&contents).map_err(|e| CacheError::Corrupt(e.to_string()))?;
        if (self.now)() > envelope.expiry {
            debug!(key, expiry = %envelope.expiry, "cache miss: expired");
            return Err(CacheError::Expired(key.to_string()).into());
        }

        STANDARD
            .decode(envelope.value)
            .map_err(|e| CacheError::Corrupt(e.to_string()).into())
    }

    /// Remove the entry under `key`; absent entries are fine.
    pub fn remove(&self, key: &str) -> Result<()> {
        match fs::remove_file(self.path_for(key)?) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CacheError::Io(e).into()),
        }
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key != "."
            && key != ".."
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
        if !valid {
            return Err(CacheError::InvalidKey(key.to_string()).into());
        }
        Ok(self.dir.join(key))
    }
}

impl std::fmt::Debug for FileCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileCache").field("dir", &self.dir).finish()
    }
}

// Cached values are credentials: keep them owner-readable only.
fn write_private(path: &Path, contents: &[u8]) -> Result<()> {
    fs::write(path, contents).map_err(CacheError::Io)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600)).map_err(CacheError::Io)?;
    }
    Ok(())
}
