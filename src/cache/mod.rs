//! Content-addressed response cache
//!
//! Maps a request fingerprint to the raw bytes an upstream service returned.
//! Entries live as `<fingerprint>.bin` files; the file's modification time is
//! the write time used for expiry. Stale or missing entries are refetched
//! transparently. Expired files are overwritten, never garbage-collected.
//!
//! All reads and writes for one fingerprint are serialized through an
//! in-flight lock, so concurrent callers asking for the same request share a
//! single upstream fetch.

pub mod fingerprint;
pub mod paths;
pub mod throttle;
pub mod traits;

pub use fingerprint::{canonical_json, fingerprint};
pub use paths::{default_cache_dir, ensure_cache_dir, entry_path};
pub use throttle::HostThrottle;
pub use traits::{Transport, UreqTransport};

use crate::config::Settings;
use crate::error::Result;
use dashmap::DashMap;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};
use tracing::debug;

/// One upstream request as the cache sees it
#[derive(Debug, Clone, PartialEq)]
pub struct CachedRequest {
    pub method: String,
    pub url: String,
    /// Query-string parameters (JSON object)
    pub params: Value,
    /// Form body fields (JSON object), `Null` for no body
    pub body: Value,
}

impl CachedRequest {
    pub fn get(url: impl Into<String>, params: Value) -> Self {
        Self {
            method: "GET".to_string(),
            url: url.into(),
            params,
            body: Value::Null,
        }
    }

    pub fn post_form(url: impl Into<String>, body: Value) -> Self {
        Self {
            method: "POST".to_string(),
            url: url.into(),
            params: Value::Null,
            body,
        }
    }

    pub fn fingerprint(&self) -> String {
        fingerprint(&self.method, &self.url, &self.params, &self.body)
    }

    /// Authority part of the URL (`host[:port]`), used as the throttle key.
    pub fn host(&self) -> &str {
        host_of(&self.url)
    }
}

fn host_of(url: &str) -> &str {
    let rest = url.split_once("://").map(|(_, r)| r).unwrap_or(url);
    let end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    let authority = &rest[..end];
    // Drop userinfo if present
    authority.rsplit_once('@').map(|(_, h)| h).unwrap_or(authority)
}

/// Thread-safe response cache shared by every evidence adapter
pub struct ResponseCache {
    dir: PathBuf,
    transport: Arc<dyn Transport>,
    throttle: Arc<HostThrottle>,
    /// Fingerprint -> lock held while that entry is being read or refreshed
    in_flight: DashMap<String, Arc<Mutex<()>>>,
}

impl ResponseCache {
    pub fn new(dir: impl Into<PathBuf>, transport: Arc<dyn Transport>, throttle: Arc<HostThrottle>) -> Self {
        Self {
            dir: dir.into(),
            transport,
            throttle,
            in_flight: DashMap::new(),
        }
    }

    /// Cache backed by ureq with the configured timeout and politeness delay
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            settings.cache_dir.clone(),
            Arc::new(UreqTransport::new(settings.request_timeout())),
            Arc::new(HostThrottle::new(settings.polite_delay())),
        )
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Return the payload for `request`, from disk when younger than `ttl`,
    /// otherwise from the network (after the per-host throttle).
    ///
    /// Upstream failures propagate unchanged and leave the cache untouched.
    pub fn fetch(&self, request: &CachedRequest, ttl: Duration) -> Result<Vec<u8>> {
        let key = request.fingerprint();
        let lock = self
            .in_flight
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let result = {
            // The guarded value is (), so a poisoned lock carries no broken state
            let _guard = lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            self.fetch_locked(request, &key, ttl)
        };
        drop(lock);
        // Only the map still holds the lock once every waiter has finished
        self.in_flight
            .remove_if(&key, |_, lock| Arc::strong_count(lock) == 1);
        result
    }

    fn fetch_locked(&self, request: &CachedRequest, key: &str, ttl: Duration) -> Result<Vec<u8>> {
        let path = entry_path(&self.dir, key);
        if let Some(bytes) = read_fresh(&path, ttl)? {
            debug!("Cache hit {} {} ({})", request.method, request.url, &key[..12]);
            return Ok(bytes);
        }

        debug!("Cache miss {} {} ({})", request.method, request.url, &key[..12]);
        self.throttle.wait(request.host());
        let bytes = self.transport.send(request)?;

        ensure_cache_dir(&self.dir)?;
        write_atomic(&path, &bytes)?;
        Ok(bytes)
    }

    /// Whether a fresh entry exists for `request` (no network access)
    pub fn contains_fresh(&self, request: &CachedRequest, ttl: Duration) -> bool {
        let path = entry_path(&self.dir, &request.fingerprint());
        matches!(read_fresh(&path, ttl), Ok(Some(_)))
    }
}

fn read_fresh(path: &Path, ttl: Duration) -> Result<Option<Vec<u8>>> {
    let metadata = match std::fs::metadata(path) {
        Ok(m) => m,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let written = metadata.modified()?;
    // A timestamp in the future counts as age zero
    let age = SystemTime::now()
        .duration_since(written)
        .unwrap_or(Duration::ZERO);
    if age >= ttl {
        return Ok(None);
    }
    Ok(Some(std::fs::read(path)?))
}

/// Write via a sibling temp file so readers never see a half-written blob
fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let tmp = path.with_extension(format!("tmp{}", std::process::id()));
    std::fs::write(&tmp, bytes)?;
    std::fs::rename(&tmp, path)
}
