// SPDX-License-Identifier: MPL-2.0

//! Photo cache: an in-memory LRU in front of sqlite blob storage, so detail
//! cards reopen instantly and photos survive app restarts.

use crate::cache::{CacheDb, CacheError};
use rusqlite::params;
use std::collections::HashMap;
use std::sync::Mutex;

/// Photos held in memory at once. Memory photos are bigger than avatars, so
/// this is deliberately small.
const MEMORY_CACHE_CAPACITY: usize = 48;

/// Disk cache ceiling (64MB).
const MAX_DISK_CACHE_BYTES: i64 = 64 * 1024 * 1024;

/// Photos untouched for this long get dropped (30 days).
const MAX_MEDIA_AGE_SECS: i64 = 30 * 24 * 60 * 60;

#[derive(Clone)]
pub struct CachedMedia {
    pub data: Vec<u8>,
    pub content_type: Option<String>,
}

struct LruCache {
    map: HashMap<String, CachedMedia>,
    // Most recently used at the end.
    order: Vec<String>,
    capacity: usize,
}

impl LruCache {
    fn new(capacity: usize) -> Self {
        Self {
            map: HashMap::with_capacity(capacity),
            order: Vec::with_capacity(capacity),
            capacity,
        }
    }

    fn get(&mut self, key: &str) -> Option<CachedMedia> {
        let media = self.map.get(key).cloned()?;
        self.order.retain(|k| k != key);
        self.order.push(key.to_string());
        Some(media)
    }

    fn insert(&mut self, key: String, value: CachedMedia) {
        while self.map.len() >= self.capacity && !self.order.is_empty() {
            let oldest = self.order.remove(0);
            self.map.remove(&oldest);
        }
        self.map.insert(key.clone(), value);
        self.order.retain(|k| k != &key);
        self.order.push(key);
    }
}

pub struct MediaCache {
    memory: Mutex<LruCache>,
}

impl MediaCache {
    pub fn new() -> Self {
        Self {
            memory: Mutex::new(LruCache::new(MEMORY_CACHE_CAPACITY)),
        }
    }

    /// Memory first, then disk; disk hits are promoted.
    pub fn get(&self, db: &CacheDb, url: &str) -> Option<CachedMedia> {
        if let Some(media) = self.memory.lock().unwrap().get(url) {
            return Some(media);
        }

        let media = self.get_from_disk(db, url).ok()?;
        self.memory
            .lock()
            .unwrap()
            .insert(url.to_string(), media.clone());
        Some(media)
    }

    pub fn store(
        &self,
        db: &CacheDb,
        url: &str,
        data: Vec<u8>,
        content_type: Option<String>,
    ) -> Result<(), CacheError> {
        let media = CachedMedia {
            data,
            content_type,
        };
        self.store_to_disk(db, url, &media)?;
        self.memory.lock().unwrap().insert(url.to_string(), media);
        Ok(())
    }

    fn get_from_disk(&self, db: &CacheDb, url: &str) -> Result<CachedMedia, CacheError> {
        let conn = db.conn();
        let now = CacheDb::now();

        let mut stmt = conn.prepare(
            r#"
            UPDATE media SET last_accessed_at = ?1 WHERE url = ?2
            RETURNING data, content_type
            "#,
        )?;

        stmt.query_row(params![now, url], |row| {
            Ok(CachedMedia {
                data: row.get(0)?,
                content_type: row.get(1)?,
            })
        })
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => CacheError::NotFound,
            other => CacheError::Database(other),
        })
    }

    fn store_to_disk(&self, db: &CacheDb, url: &str, media: &CachedMedia) -> Result<(), CacheError> {
        let conn = db.conn();
        let now = CacheDb::now();

        conn.execute(
            r#"
            INSERT INTO media (url, data, content_type, size, fetched_at, last_accessed_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?5)
            ON CONFLICT(url) DO UPDATE SET
                data = excluded.data,
                content_type = excluded.content_type,
                size = excluded.size,
                fetched_at = excluded.fetched_at,
                last_accessed_at = excluded.last_accessed_at
            "#,
            params![
                url,
                media.data,
                media.content_type,
                media.data.len() as i64,
                now
            ],
        )?;

        Ok(())
    }

    /// Drop stale photos, then trim oldest-first while over the size ceiling.
    pub fn cleanup(&self, db: &CacheDb) -> Result<(), CacheError> {
        let conn = db.conn();
        let now = CacheDb::now();

        conn.execute(
            "DELETE FROM media WHERE last_accessed_at < ?",
            [now - MAX_MEDIA_AGE_SECS],
        )?;

        loop {
            let total: i64 = conn.query_row(
                "SELECT COALESCE(SUM(size), 0) FROM media",
                [],
                |row| row.get(0),
            )?;
            if total <= MAX_DISK_CACHE_BYTES {
                break;
            }
            let evicted = conn.execute(
                r#"
                DELETE FROM media WHERE url = (
                    SELECT url FROM media ORDER BY last_accessed_at ASC LIMIT 1
                )
                "#,
                [],
            )?;
            if evicted == 0 {
                break;
            }
        }

        Ok(())
    }
}

impl Default for MediaCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disk_round_trip() {
        let db = CacheDb::open_in_memory().unwrap();
        let cache = MediaCache::new();

        cache
            .store(&db, "https://x/1.jpg", vec![1, 2, 3], Some("image/jpeg".into()))
            .unwrap();

        let media = cache.get(&db, "https://x/1.jpg").unwrap();
        assert_eq!(media.data, vec![1, 2, 3]);
        assert_eq!(media.content_type.as_deref(), Some("image/jpeg"));
    }

    #[test]
    fn test_miss_is_none() {
        let db = CacheDb::open_in_memory().unwrap();
        let cache = MediaCache::new();
        assert!(cache.get(&db, "https://x/absent.jpg").is_none());
    }

    #[test]
    fn test_disk_survives_memory_eviction() {
        let db = CacheDb::open_in_memory().unwrap();
        let cache = MediaCache::new();

        for i in 0..(MEMORY_CACHE_CAPACITY + 4) {
            cache
                .store(&db, &format!("https://x/{i}.jpg"), vec![i as u8], None)
                .unwrap();
        }

        // The first entry left the LRU but is still on disk.
        let media = cache.get(&db, "https://x/0.jpg").unwrap();
        assert_eq!(media.data, vec![0]);
    }

    #[test]
    fn test_lru_eviction_order() {
        let mut lru = LruCache::new(2);
        lru.insert(
            "a".into(),
            CachedMedia { data: vec![], content_type: None },
        );
        lru.insert(
            "b".into(),
            CachedMedia { data: vec![], content_type: None },
        );
        // Touch "a" so "b" is the eviction candidate.
        lru.get("a");
        lru.insert(
            "c".into(),
            CachedMedia { data: vec![], content_type: None },
        );
        assert!(lru.get("a").is_some());
        assert!(lru.get("b").is_none());
        assert!(lru.get("c").is_some());
    }
}
