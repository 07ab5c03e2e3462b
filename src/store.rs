//! Key-value store contracts and an in-process implementation.
//!
//! The UI reads data through a [`FetchSource`] (one batch round trip per poll) and
//! writes one-way command requests through a [`RequestSink`]. Sensor daemons and
//! command consumers sit on the other side of the same store.
//!
//! # Request Layout
//!
//! A request `name` with parameters is stored as:
//!
//! ```text
//! name               = "1"      (ttl: REQUEST_TTL)
//! name.Param:<param> = <value>  (ttl: REQUEST_TTL)
//! ```
//!
//! A consumer acknowledges by deleting those entries ([`MemoryStore::take_request`]).
//! An unconsumed request simply expires.

use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::config::REQUEST_TTL;
use crate::error::SourceError;

// =============================================================================
// Snapshot
// =============================================================================

/// Immutable result of one fetch: every requested key, present or absent.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Snapshot {
    values: HashMap<String, Option<String>>,
}

impl Snapshot {
    pub fn new() -> Self { Self::default() }

    /// Value of `key`, `None` if absent or never requested.
    pub fn get(
        &self,
        key: &str,
    ) -> Option<&str> {
        self.values.get(key).and_then(Option::as_deref)
    }

    /// Value of `key` parsed as `T`.
    pub fn parse<T: FromStr>(
        &self,
        key: &str,
    ) -> Option<T> {
        self.get(key).and_then(|value| value.trim().parse().ok())
    }

    /// Whether `key` was requested and the store had no value for it.
    pub fn is_absent(
        &self,
        key: &str,
    ) -> bool {
        matches!(self.values.get(key), Some(None))
    }

    pub fn contains_key(
        &self,
        key: &str,
    ) -> bool {
        self.values.contains_key(key)
    }

    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: Option<String>,
    ) {
        self.values.insert(key.into(), value);
    }

    pub fn len(&self) -> usize { self.values.len() }

    pub fn is_empty(&self) -> bool { self.values.is_empty() }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.values.iter().map(|(key, value)| (key.as_str(), value.as_deref()))
    }
}

impl<K: Into<String>> FromIterator<(K, Option<String>)> for Snapshot {
    fn from_iter<I: IntoIterator<Item = (K, Option<String>)>>(iter: I) -> Self {
        Self { values: iter.into_iter().map(|(key, value)| (key.into(), value)).collect() }
    }
}

// =============================================================================
// Contracts
// =============================================================================

/// Batch reader polled by the fetch worker.
pub trait FetchSource: Send + 'static {
    /// Read every key in one round trip. Keys without a value must be present in
    /// the result as absent.
    fn fetch_batch(
        &mut self,
        keys: &[String],
    ) -> Result<Snapshot, SourceError>;
}

/// One-way command channel from the UI to the daemons.
pub trait RequestSink {
    /// Publish request `name` with `params`. The request expires after
    /// [`REQUEST_TTL`] if nobody consumes it.
    fn publish_request(
        &mut self,
        name: &str,
        params: &[(&str, &str)],
    ) -> Result<(), SourceError>;
}

/// Store key holding parameter `param` of request `name`.
pub fn request_param_key(
    name: &str,
    param: &str,
) -> String {
    format!("{name}.Param:{param}")
}

// =============================================================================
// Memory Store
// =============================================================================

#[derive(Debug)]
struct Entry {
    value: String,
    expires: Option<Instant>,
}

impl Entry {
    fn is_live(
        &self,
        now: Instant,
    ) -> bool {
        self.expires.is_none_or(|at| now < at)
    }
}

/// Thread-safe in-process key-value store with per-key expiry.
///
/// Clones share the same data, so one handle can feed the fetch worker while
/// others are written by daemon threads.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, Entry>>>,
}

impl MemoryStore {
    pub fn new() -> Self { Self::default() }

    /// Set `key`, expiring after `ttl` if given.
    pub fn set(
        &self,
        key: &str,
        value: &str,
        ttl: Option<Duration>,
    ) {
        let expires = ttl.map(|ttl| Instant::now() + ttl);
        self.entries.lock().insert(key.to_owned(), Entry { value: value.to_owned(), expires });
    }

    /// Set or delete several keys under one lock. `None` deletes.
    pub fn set_many(
        &self,
        values: &[(&str, Option<&str>)],
        ttl: Option<Duration>,
    ) {
        let expires = ttl.map(|ttl| Instant::now() + ttl);
        let mut entries = self.entries.lock();
        for &(key, value) in values {
            match value {
                Some(value) => {
                    entries.insert(key.to_owned(), Entry { value: value.to_owned(), expires });
                }
                None => {
                    entries.remove(key);
                }
            }
        }
    }

    pub fn get(
        &self,
        key: &str,
    ) -> Option<String> {
        let mut entries = self.entries.lock();
        let now = Instant::now();
        match entries.get(key) {
            Some(entry) if entry.is_live(now) => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn delete(
        &self,
        key: &str,
    ) -> bool {
        self.entries.lock().remove(key).is_some()
    }

    /// Consume request `name` if it is pending: return its parameters and delete
    /// the request and all of its parameter entries.
    pub fn take_request(
        &self,
        name: &str,
    ) -> Option<BTreeMap<String, String>> {
        let prefix = request_param_key(name, "");
        let now = Instant::now();
        let mut entries = self.entries.lock();

        let pending = entries.remove(name).is_some_and(|entry| entry.is_live(now));
        let param_keys: Vec<String> = entries.keys().filter(|key| key.starts_with(&prefix)).cloned().collect();
        let mut params = BTreeMap::new();
        for key in param_keys {
            if let Some(entry) = entries.remove(&key)
                && entry.is_live(now)
            {
                params.insert(key[prefix.len()..].to_owned(), entry.value);
            }
        }
        pending.then_some(params)
    }

    /// Drop every expired entry.
    pub fn purge_expired(&self) {
        let now = Instant::now();
        self.entries.lock().retain(|_, entry| entry.is_live(now));
    }
}

impl FetchSource for MemoryStore {
    fn fetch_batch(
        &mut self,
        keys: &[String],
    ) -> Result<Snapshot, SourceError> {
        let now = Instant::now();
        let entries = self.entries.lock();
        Ok(keys
            .iter()
            .map(|key| {
                let value = entries.get(key).filter(|entry| entry.is_live(now)).map(|entry| entry.value.clone());
                (key.clone(), value)
            })
            .collect())
    }
}

impl RequestSink for MemoryStore {
    fn publish_request(
        &mut self,
        name: &str,
        params: &[(&str, &str)],
    ) -> Result<(), SourceError> {
        let param_keys: Vec<String> = params.iter().map(|(param, _)| request_param_key(name, param)).collect();
        let mut values: Vec<(&str, Option<&str>)> = vec![(name, Some("1"))];
        values.extend(param_keys.iter().zip(params).map(|(key, (_, value))| (key.as_str(), Some(*value))));
        self.set_many(&values, Some(REQUEST_TTL));
        tracing::debug!(request = name, params = params.len(), "request published");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    #[test]
    fn test_fetch_batch_reports_absent_keys() {
        let mut store = MemoryStore::new();
        store.set("GPS.Speed", "88", None);
        let snapshot = store.fetch_batch(&["GPS.Speed".into(), "GPS.Fix".into()]).unwrap();
        assert_eq!(snapshot.len(), 2, "missing keys are not omitted");
        assert_eq!(snapshot.get("GPS.Speed"), Some("88"));
        assert!(snapshot.is_absent("GPS.Fix"));
        assert!(!snapshot.is_absent("GPS.Speed"));
        assert!(!snapshot.contains_key("Other"));
        assert_eq!(snapshot.parse::<u32>("GPS.Speed"), Some(88));
    }

    #[test]
    fn test_entries_expire() {
        let mut store = MemoryStore::new();
        store.set("Net.Ping", "12", Some(Duration::from_millis(20)));
        store.set("Net.Name", "wlan0", None);
        assert_eq!(store.get("Net.Ping").as_deref(), Some("12"));
        thread::sleep(Duration::from_millis(40));
        assert_eq!(store.get("Net.Ping"), None);
        let snapshot = store.fetch_batch(&["Net.Ping".into()]).unwrap();
        assert!(snapshot.is_absent("Net.Ping"));
        assert_eq!(store.get("Net.Name").as_deref(), Some("wlan0"));
    }

    #[test]
    fn test_set_many_deletes_none() {
        let store = MemoryStore::new();
        store.set("a", "1", None);
        store.set_many(&[("a", None), ("b", Some("2"))], None);
        assert_eq!(store.get("a"), None);
        assert_eq!(store.get("b").as_deref(), Some("2"));
    }

    #[test]
    fn test_request_round_trip() {
        let mut store = MemoryStore::new();
        store.publish_request("Media.Play", &[("Track", "7"), ("Volume", "40")]).unwrap();
        assert_eq!(store.get("Media.Play.Param:Track").as_deref(), Some("7"));

        let params = store.take_request("Media.Play").expect("request pending");
        assert_eq!(params.get("Track").map(String::as_str), Some("7"));
        assert_eq!(params.get("Volume").map(String::as_str), Some("40"));

        assert!(store.take_request("Media.Play").is_none(), "acknowledged requests are gone");
        assert_eq!(store.get("Media.Play.Param:Volume"), None);
    }

    #[test]
    fn test_request_without_params() {
        let mut store = MemoryStore::new();
        store.publish_request("Media.Pause", &[]).unwrap();
        assert_eq!(store.take_request("Media.Pause"), Some(BTreeMap::new()));
        assert!(store.take_request("Never.Sent").is_none());
    }

    #[test]
    fn test_clones_share_data() {
        let store = MemoryStore::new();
        let writer = store.clone();
        thread::spawn(move || writer.set("OBD.Rpm", "2100", None)).join().unwrap();
        assert_eq!(store.get("OBD.Rpm").as_deref(), Some("2100"));
        store.purge_expired();
        assert!(store.delete("OBD.Rpm"));
    }
}
