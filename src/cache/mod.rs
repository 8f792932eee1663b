use crate::diff::parse_response;
use anyhow::{Context, Result};
use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

const INDEX_FILE: &str = "index.json";
const BAD_INDEX_FILE: &str = "index.json.bad";

/// One cached diff response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// `"<from>-<to>"`
    pub key: String,
    /// File name inside the cache dir
    pub file: String,
    pub fetched_at: DateTime<Utc>,
    #[serde(default)]
    pub viewed_at: Option<DateTime<Utc>>,
    /// Pinned entries are never purged
    #[serde(default)]
    pub pinned: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct CacheIndex {
    #[serde(default)]
    entries: Vec<CacheEntry>,
}

pub fn cache_key(from: u64, to: u64) -> String {
    format!("{}-{}", from, to)
}

/// Inverse of the `"<from>-<to>.json"` naming used by `import`
fn parse_cache_file_name(name: &str) -> Option<(u64, u64)> {
    let (from, to) = name.strip_suffix(".json")?.split_once('-')?;
    Some((from.parse().ok()?, to.parse().ok()?))
}

/// A bare file name that stays inside the cache dir when joined onto it
fn is_plain_file_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    ) && !name.contains('\\')
}

/// Midnight UTC `days` days before `date`'s UTC calendar day
pub fn days_before_midnight_utc(days: u32, date: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let day = date
        .date_naive()
        .checked_sub_days(chrono::Days::new(u64::from(days)))?;
    Some(day.and_time(NaiveTime::MIN).and_utc())
}

/// On-disk store of diff responses keyed by revision pair
pub struct DiffCache {
    dir: PathBuf,
    max_age_days: u32,
    index: CacheIndex,
}

impl DiffCache {
    /// Open (creating if needed) the cache at `dir`.
    ///
    /// A corrupt index is moved aside to `index.json.bad` and rebuilt from
    /// the response files on disk, all of them pinned. An index that exists
    /// but cannot be read is an error. Entries whose file name would leave
    /// the cache dir are dropped.
    pub fn open(dir: &Path, max_age_days: u32) -> Result<Self> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create cache dir {}", dir.display()))?;

        let index_path = dir.join(INDEX_FILE);
        let mut rebuilt = false;
        let mut index = match std::fs::read_to_string(&index_path) {
            Ok(content) => match serde_json::from_str::<CacheIndex>(&content) {
                Ok(index) => index,
                Err(e) => {
                    let backup = dir.join(BAD_INDEX_FILE);
                    log::warn!(
                        "Failed to parse {}: {}; moved to {} and rebuilding",
                        index_path.display(),
                        e,
                        backup.display()
                    );
                    std::fs::rename(&index_path, &backup)
                        .with_context(|| format!("Failed to move {}", index_path.display()))?;
                    rebuilt = true;
                    rebuild_index(dir)?
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => CacheIndex::default(),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {}", index_path.display()))
            }
        };

        index.entries.retain(|e| {
            let plain = is_plain_file_name(&e.file);
            if !plain {
                log::warn!("Ignoring cache entry {} with file {:?}", e.key, e.file);
            }
            plain
        });

        let cache = Self {
            dir: dir.to_path_buf(),
            max_age_days,
            index,
        };
        if rebuilt {
            cache.save()?;
        }
        Ok(cache)
    }

    #[allow(dead_code)]
    pub fn entries(&self) -> &[CacheEntry] {
        &self.index.entries
    }

    fn find(&self, key: &str) -> Option<&CacheEntry> {
        self.index.entries.iter().find(|e| e.key == key)
    }

    /// Copy a response file into the cache, replacing any entry for the same pair
    pub fn import(
        &mut self,
        source: &Path,
        from: u64,
        to: u64,
        pinned: bool,
        now: DateTime<Utc>,
    ) -> Result<PathBuf> {
        let raw = std::fs::read_to_string(source)
            .with_context(|| format!("Failed to read {}", source.display()))?;
        parse_response(&raw).with_context(|| format!("In {}", source.display()))?;

        let key = cache_key(from, to);
        let file = format!("{}.json", key);
        let dest = self.dir.join(&file);
        std::fs::write(&dest, &raw)
            .with_context(|| format!("Failed to write {}", dest.display()))?;

        self.index.entries.retain(|e| e.key != key);
        self.index.entries.push(CacheEntry {
            key,
            file,
            fetched_at: now,
            viewed_at: None,
            pinned,
        });
        self.save()?;

        log::info!("cached {} as {}", source.display(), dest.display());
        Ok(dest)
    }

    pub fn lookup(&self, from: u64, to: u64) -> Option<PathBuf> {
        self.find(&cache_key(from, to)).map(|e| self.dir.join(&e.file))
    }

    /// Record that the pair was viewed. Returns false when it is not cached.
    pub fn mark_viewed(&mut self, from: u64, to: u64, now: DateTime<Utc>) -> Result<bool> {
        let key = cache_key(from, to);
        let Some(entry) = self.index.entries.iter_mut().find(|e| e.key == key) else {
            return Ok(false);
        };
        entry.viewed_at = Some(now);
        self.save()?;
        Ok(true)
    }

    /// Delete entries fetched before the cutoff (midnight UTC `max_age_days`
    /// ago) that are neither pinned nor viewed since the cutoff, plus any
    /// response files no entry references. Returns the deleted paths.
    pub fn housekeep(&mut self, now: DateTime<Utc>) -> Result<Vec<PathBuf>> {
        let Some(cutoff) = days_before_midnight_utc(self.max_age_days, now) else {
            log::warn!("Could not compute cache cutoff for {} days", self.max_age_days);
            return Ok(Vec::new());
        };

        let (keep, stale): (Vec<CacheEntry>, Vec<CacheEntry>) =
            self.index.entries.drain(..).partition(|e| {
                e.pinned || e.fetched_at >= cutoff || e.viewed_at.is_some_and(|v| v >= cutoff)
            });
        self.index.entries = keep;

        let mut deleted = Vec::new();
        for entry in &stale {
            let path = self.dir.join(&entry.file);
            match std::fs::remove_file(&path) {
                Ok(()) => deleted.push(path),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => log::warn!("Failed to remove {}: {}", path.display(), e),
            }
        }

        let referenced: HashSet<&str> = self.index.entries.iter().map(|e| e.file.as_str()).collect();
        let mut orphans = Vec::new();
        for dir_entry in std::fs::read_dir(&self.dir)
            .with_context(|| format!("Failed to list {}", self.dir.display()))?
        {
            let path = dir_entry?.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if name == INDEX_FILE
                || !name.ends_with(".json")
                || referenced.contains(name)
                || deleted.contains(&path)
            {
                continue;
            }
            orphans.push(path);
        }
        for path in orphans {
            match std::fs::remove_file(&path) {
                Ok(()) => deleted.push(path),
                Err(e) => log::warn!("Failed to remove {}: {}", path.display(), e),
            }
        }

        if !stale.is_empty() {
            self.save()?;
        }
        log::info!(
            "housekeeping removed {} file(s), {} entr{} kept",
            deleted.len(),
            self.index.entries.len(),
            if self.index.entries.len() == 1 { "y" } else { "ies" }
        );
        Ok(deleted)
    }

    fn save(&self) -> Result<()> {
        let path = self.dir.join(INDEX_FILE);
        let content = serde_json::to_string_pretty(&self.index)?;
        std::fs::write(&path, content)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }
}

/// Recreate entries for every `<from>-<to>.json` file in `dir`. Nothing is
/// known about user state, so every entry is pinned.
fn rebuild_index(dir: &Path) -> Result<CacheIndex> {
    let mut entries = Vec::new();
    for dir_entry in
        std::fs::read_dir(dir).with_context(|| format!("Failed to list {}", dir.display()))?
    {
        let dir_entry = dir_entry?;
        let Some(name) = dir_entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        let Some((from, to)) = parse_cache_file_name(&name) else {
            continue;
        };
        let fetched_at = dir_entry
            .metadata()
            .and_then(|m| m.modified())
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| Utc::now());
        entries.push(CacheEntry {
            key: cache_key(from, to),
            file: name,
            fetched_at,
            viewed_at: None,
            pinned: true,
        });
    }
    entries.sort_by(|a, b| a.key.cmp(&b.key));
    log::info!("rebuilt cache index with {} entries", entries.len());
    Ok(CacheIndex { entries })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::fs;

    const RESPONSE: &str = r#"{"diff":[{"lineNumber":1,"type":1,"text":"x"}]}"#;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn source_file(dir: &Path) -> PathBuf {
        let path = dir.join("response.json");
        fs::write(&path, RESPONSE).unwrap();
        path
    }

    #[test]
    fn cutoff_is_midnight_utc() {
        let cutoff = days_before_midnight_utc(30, at(2024, 3, 31, 15)).unwrap();
        assert_eq!(cutoff, at(2024, 3, 1, 0));
        assert_eq!(days_before_midnight_utc(0, at(2024, 3, 31, 15)).unwrap(), at(2024, 3, 31, 0));
    }

    #[test]
    fn import_lookup_and_reopen() {
        let src = tempfile::tempdir().unwrap();
        let cache_dir = tempfile::tempdir().unwrap();
        let mut cache = DiffCache::open(cache_dir.path(), 30).unwrap();

        let dest = cache
            .import(&source_file(src.path()), 10, 20, false, at(2024, 1, 1, 0))
            .unwrap();
        assert_eq!(fs::read_to_string(&dest).unwrap(), RESPONSE);
        assert_eq!(cache.lookup(10, 20), Some(dest.clone()));
        assert_eq!(cache.lookup(20, 10), None);

        let reopened = DiffCache::open(cache_dir.path(), 30).unwrap();
        assert_eq!(reopened.entries().len(), 1);
        assert_eq!(reopened.entries()[0].key, "10-20");
    }

    #[test]
    fn import_rejects_invalid_response() {
        let src = tempfile::tempdir().unwrap();
        let cache_dir = tempfile::tempdir().unwrap();
        let bad = src.path().join("bad.json");
        fs::write(&bad, r#"{"diff": 5}"#).unwrap();
        let mut cache = DiffCache::open(cache_dir.path(), 30).unwrap();
        assert!(cache.import(&bad, 1, 2, false, at(2024, 1, 1, 0)).is_err());
        assert!(cache.entries().is_empty());
    }

    #[test]
    fn reimport_replaces_entry() {
        let src = tempfile::tempdir().unwrap();
        let cache_dir = tempfile::tempdir().unwrap();
        let mut cache = DiffCache::open(cache_dir.path(), 30).unwrap();
        let file = source_file(src.path());
        cache.import(&file, 1, 2, false, at(2024, 1, 1, 0)).unwrap();
        cache.import(&file, 1, 2, true, at(2024, 2, 1, 0)).unwrap();
        assert_eq!(cache.entries().len(), 1);
        assert!(cache.entries()[0].pinned);
        assert_eq!(cache.entries()[0].fetched_at, at(2024, 2, 1, 0));
    }

    #[test]
    fn housekeeping_keeps_pinned_recent_and_viewed() {
        let src = tempfile::tempdir().unwrap();
        let cache_dir = tempfile::tempdir().unwrap();
        let mut cache = DiffCache::open(cache_dir.path(), 30).unwrap();
        let file = source_file(src.path());

        let old = at(2024, 1, 1, 12);
        cache.import(&file, 1, 2, false, old).unwrap(); // stale
        cache.import(&file, 3, 4, true, old).unwrap(); // pinned
        cache.import(&file, 5, 6, false, old).unwrap(); // viewed recently
        cache.import(&file, 7, 8, false, at(2024, 3, 20, 0)).unwrap(); // fresh

        let now = at(2024, 3, 31, 9);
        assert!(cache.mark_viewed(5, 6, at(2024, 3, 15, 0)).unwrap());
        assert!(!cache.mark_viewed(9, 9, now).unwrap());

        let deleted = cache.housekeep(now).unwrap();
        assert_eq!(deleted, vec![cache_dir.path().join("1-2.json")]);
        assert!(cache.lookup(1, 2).is_none());
        assert!(cache.lookup(3, 4).is_some());
        assert!(cache.lookup(5, 6).is_some());
        assert!(cache.lookup(7, 8).is_some());

        let reopened = DiffCache::open(cache_dir.path(), 30).unwrap();
        assert_eq!(reopened.entries().len(), 3);
    }

    #[test]
    fn housekeeping_removes_orphans_only() {
        let cache_dir = tempfile::tempdir().unwrap();
        fs::write(cache_dir.path().join("99-100.json"), RESPONSE).unwrap();
        fs::write(cache_dir.path().join("notes.txt"), "keep").unwrap();
        let mut cache = DiffCache::open(cache_dir.path(), 30).unwrap();

        let deleted = cache.housekeep(at(2024, 3, 31, 0)).unwrap();
        assert_eq!(deleted, vec![cache_dir.path().join("99-100.json")]);
        assert!(cache_dir.path().join("notes.txt").exists());
    }

    #[test]
    fn corrupt_index_is_moved_aside() {
        let cache_dir = tempfile::tempdir().unwrap();
        fs::write(cache_dir.path().join(INDEX_FILE), "{ nope").unwrap();
        let cache = DiffCache::open(cache_dir.path(), 30).unwrap();
        assert!(cache.entries().is_empty());
        assert_eq!(
            fs::read_to_string(cache_dir.path().join(BAD_INDEX_FILE)).unwrap(),
            "{ nope"
        );
    }

    #[test]
    fn corrupt_index_never_loses_cached_files() {
        let src = tempfile::tempdir().unwrap();
        let cache_dir = tempfile::tempdir().unwrap();
        let file = source_file(src.path());
        let old = at(2024, 1, 1, 0);

        let mut cache = DiffCache::open(cache_dir.path(), 30).unwrap();
        cache.import(&file, 1, 2, true, old).unwrap();
        cache.import(&file, 5, 6, false, old).unwrap();
        fs::write(cache_dir.path().join(INDEX_FILE), "{ truncated").unwrap();

        let mut cache = DiffCache::open(cache_dir.path(), 30).unwrap();
        let keys: Vec<&str> = cache.entries().iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["1-2", "5-6"]);
        assert!(cache.entries().iter().all(|e| e.pinned));

        cache.import(&file, 3, 4, false, at(2024, 3, 30, 0)).unwrap();
        let deleted = cache.housekeep(at(2024, 3, 31, 0)).unwrap();
        assert!(deleted.is_empty());
        assert!(cache_dir.path().join("1-2.json").exists());
        assert!(cache_dir.path().join("5-6.json").exists());
        assert!(cache_dir.path().join("3-4.json").exists());
    }

    #[test]
    fn unreadable_index_is_an_error() {
        let cache_dir = tempfile::tempdir().unwrap();
        fs::create_dir(cache_dir.path().join(INDEX_FILE)).unwrap();
        assert!(DiffCache::open(cache_dir.path(), 30).is_err());
    }

    #[test]
    fn entries_pointing_outside_the_cache_are_dropped() {
        let root = tempfile::tempdir().unwrap();
        let cache_dir = root.path().join("cache");
        fs::create_dir(&cache_dir).unwrap();
        let outside = root.path().join("x.json");
        fs::write(&outside, RESPONSE).unwrap();
        fs::write(
            cache_dir.join(INDEX_FILE),
            r#"{"entries": [{"key": "1-2", "file": "../x.json", "fetched_at": "2020-01-01T00:00:00Z"}]}"#,
        )
        .unwrap();

        let mut cache = DiffCache::open(&cache_dir, 30).unwrap();
        assert!(cache.entries().is_empty());
        assert!(cache.lookup(1, 2).is_none());
        cache.housekeep(at(2024, 3, 31, 0)).unwrap();
        assert!(outside.exists());
    }

    #[test]
    fn file_name_checks() {
        assert!(is_plain_file_name("1-2.json"));
        assert!(!is_plain_file_name("../x.json"));
        assert!(!is_plain_file_name("/tmp/x.json"));
        assert!(!is_plain_file_name("sub/x.json"));
        assert!(!is_plain_file_name(".."));
        assert!(!is_plain_file_name(""));
        assert_eq!(parse_cache_file_name("10-20.json"), Some((10, 20)));
        assert_eq!(parse_cache_file_name("index.json"), None);
        assert_eq!(parse_cache_file_name("10-20.json.bad"), None);
    }
}
