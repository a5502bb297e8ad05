//! Generation metadata and staleness.
//!
//! The metadata row is the commit marker of a generation: it is written only
//! after every page of that generation is stored.

use std::collections::BTreeMap;

use super::connection::PageStore;
use super::pages::{Page, upsert_page};
use crate::Error;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Upstream bookkeeping for one page, sourced from the sitemap.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lastmod: Option<String>,
}

/// Store-wide bookkeeping for the current generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheMetadata {
    pub last_crawl: DateTime<Utc>,
    pub ttl_days: u32,
    pub pages: BTreeMap<String, PageMeta>,
}

impl CacheMetadata {
    /// Fractional days elapsed between the last crawl and `now`.
    pub fn age_days(&self, now: DateTime<Utc>) -> f64 {
        (now - self.last_crawl).num_milliseconds() as f64 / MILLIS_PER_DAY
    }

    /// Stale when strictly older than `ttl_days`.
    pub fn is_stale_at(&self, now: DateTime<Utc>) -> bool {
        self.age_days(now) > f64::from(self.ttl_days)
    }

    /// Instant at which this generation turns stale.
    pub fn next_check(&self) -> DateTime<Utc> {
        self.last_crawl + Duration::days(i64::from(self.ttl_days))
    }
}

pub(crate) fn write_metadata(conn: &rusqlite::Connection, metadata: &CacheMetadata) -> Result<(), Error> {
    let page_meta_json = serde_json::to_string(&metadata.pages)?;
    conn.execute(
        "INSERT INTO cache_metadata (id, last_crawl, ttl_days, page_meta_json)
        VALUES (1, ?1, ?2, ?3)
        ON CONFLICT(id) DO UPDATE SET
            last_crawl = excluded.last_crawl,
            ttl_days = excluded.ttl_days,
            page_meta_json = excluded.page_meta_json",
        params![metadata.last_crawl.to_rfc3339(), metadata.ttl_days, page_meta_json],
    )?;
    Ok(())
}

fn read_metadata(conn: &rusqlite::Connection) -> Result<Option<CacheMetadata>, Error> {
    let row = conn.query_row(
        "SELECT last_crawl, ttl_days, page_meta_json FROM cache_metadata WHERE id = 1",
        [],
        |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?, row.get::<_, String>(2)?)),
    );

    let (last_crawl, ttl_days, page_meta_json) = match row {
        Ok(r) => r,
        Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let last_crawl = DateTime::parse_from_rfc3339(&last_crawl)
        .map_err(|e| Error::CorruptData(format!("last_crawl {last_crawl:?}: {e}")))?
        .with_timezone(&Utc);
    let ttl_days =
        u32::try_from(ttl_days).map_err(|_| Error::CorruptData(format!("ttl_days out of range: {ttl_days}")))?;
    let pages = serde_json::from_str(&page_meta_json)
        .map_err(|e| Error::CorruptData(format!("page metadata: {e}")))?;

    Ok(Some(CacheMetadata { last_crawl, ttl_days, pages }))
}

impl PageStore {
    /// True once metadata has been written at least once (and not cleared).
    pub async fn exists(&self) -> Result<bool, Error> {
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let exists: bool =
                    conn.query_row("SELECT EXISTS(SELECT 1 FROM cache_metadata WHERE id = 1)", [], |row| row.get(0))?;
                Ok(exists)
            })
            .await
            .map_err(Error::from)
    }

    /// Load the generation metadata.
    ///
    /// # Errors
    ///
    /// `NotFound` if no generation has been committed, `CorruptData` if the
    /// stored row does not decode.
    pub async fn load_metadata(&self) -> Result<CacheMetadata, Error> {
        self.conn
            .call(move |conn| -> Result<Option<CacheMetadata>, Error> { read_metadata(conn) })
            .await
            .map_err(Error::from)?
            .ok_or_else(|| Error::NotFound("cache metadata".to_string()))
    }

    /// Overwrite the generation metadata.
    ///
    /// Call only after every page of the generation has been saved; the
    /// metadata row is what marks the generation as complete.
    pub async fn save_metadata(&self, metadata: &CacheMetadata) -> Result<(), Error> {
        let metadata = metadata.clone();
        self.conn
            .call(move |conn| -> Result<(), Error> { write_metadata(conn, &metadata) })
            .await
            .map_err(Error::from)
    }

    /// Staleness at the current instant; see [`PageStore::is_stale_at`].
    pub async fn is_stale(&self) -> Result<bool, Error> {
        self.is_stale_at(Utc::now()).await
    }

    /// Whether the stored generation is older than its TTL at `now`.
    ///
    /// Missing metadata counts as stale.
    pub async fn is_stale_at(&self, now: DateTime<Utc>) -> Result<bool, Error> {
        match self.load_metadata().await {
            Ok(metadata) => Ok(metadata.is_stale_at(now)),
            Err(Error::NotFound(_)) => Ok(true),
            Err(e) => Err(e),
        }
    }

    /// Remove all pages and metadata. Idempotent.
    pub async fn clear(&self) -> Result<(), Error> {
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                tx.execute("DELETE FROM cache_metadata", [])?;
                tx.execute("DELETE FROM pages", [])?;
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Replace the whole generation in a single transaction.
    ///
    /// Clears existing pages and metadata, stores `pages`, then writes
    /// `metadata` last. If anything fails the previous generation is kept.
    pub async fn replace_generation(&self, pages: Vec<Page>, metadata: &CacheMetadata) -> Result<(), Error> {
        let metadata = metadata.clone();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                tx.execute("DELETE FROM cache_metadata", [])?;
                tx.execute("DELETE FROM pages", [])?;
                for page in &pages {
                    upsert_page(&tx, page)?;
                }
                write_metadata(&tx, &metadata)?;
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::pages::tests::make_test_page;

    fn make_metadata(days_ago: i64, ttl_days: u32) -> CacheMetadata {
        let mut pages = BTreeMap::new();
        pages.insert("/a".to_string(), PageMeta { lastmod: Some("2025-01-01".into()) });
        CacheMetadata { last_crawl: Utc::now() - Duration::days(days_ago), ttl_days, pages }
    }

    #[tokio::test]
    async fn test_exists_and_round_trip() {
        let store = PageStore::open_in_memory().await.unwrap();
        assert!(!store.exists().await.unwrap());

        let metadata = make_metadata(0, 7);
        store.save_metadata(&metadata).await.unwrap();

        assert!(store.exists().await.unwrap());
        let loaded = store.load_metadata().await.unwrap();
        assert_eq!(loaded.ttl_days, 7);
        assert_eq!(loaded.pages, metadata.pages);
        assert_eq!(loaded.last_crawl.timestamp_millis(), metadata.last_crawl.timestamp_millis());
    }

    #[tokio::test]
    async fn test_load_metadata_missing() {
        let store = PageStore::open_in_memory().await.unwrap();
        assert!(matches!(store.load_metadata().await, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_stale_without_metadata() {
        let store = PageStore::open_in_memory().await.unwrap();
        assert!(store.is_stale().await.unwrap());
    }

    #[tokio::test]
    async fn test_stale_after_ttl() {
        let store = PageStore::open_in_memory().await.unwrap();
        store.save_metadata(&make_metadata(10, 7)).await.unwrap();
        assert!(store.is_stale().await.unwrap());

        store.save_metadata(&make_metadata(1, 7)).await.unwrap();
        assert!(!store.is_stale().await.unwrap());
    }

    #[test]
    fn test_stale_boundary_is_not_stale() {
        let last_crawl = Utc::now();
        let metadata = CacheMetadata { last_crawl, ttl_days: 7, pages: BTreeMap::new() };

        assert!(!metadata.is_stale_at(last_crawl + Duration::days(7)));
        assert!(metadata.is_stale_at(last_crawl + Duration::days(7) + Duration::milliseconds(1)));
    }

    #[test]
    fn test_next_check() {
        let metadata = make_metadata(0, 7);
        assert_eq!(metadata.next_check() - metadata.last_crawl, Duration::days(7));
    }

    #[tokio::test]
    async fn test_corrupt_timestamp() {
        let store = PageStore::open_in_memory().await.unwrap();
        store
            .conn
            .call(|conn| {
                conn.execute(
                    "INSERT INTO cache_metadata (id, last_crawl, ttl_days, page_meta_json) VALUES (1, 'yesterday', 7, '{}')",
                    [],
                )
            })
            .await
            .unwrap();

        assert!(matches!(store.load_metadata().await, Err(Error::CorruptData(_))));
        assert!(matches!(store.is_stale().await, Err(Error::CorruptData(_))));
    }

    #[tokio::test]
    async fn test_corrupt_page_meta() {
        let store = PageStore::open_in_memory().await.unwrap();
        let now = Utc::now().to_rfc3339();
        store
            .conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO cache_metadata (id, last_crawl, ttl_days, page_meta_json) VALUES (1, ?1, 7, 'not json')",
                    params![now],
                )
            })
            .await
            .unwrap();

        assert!(matches!(store.load_metadata().await, Err(Error::CorruptData(_))));
    }

    #[tokio::test]
    async fn test_clear_is_idempotent() {
        let store = PageStore::open_in_memory().await.unwrap();
        store.clear().await.unwrap();

        store.save_page(&make_test_page("/a")).await.unwrap();
        store.save_metadata(&make_metadata(0, 7)).await.unwrap();
        store.clear().await.unwrap();
        store.clear().await.unwrap();

        assert!(!store.exists().await.unwrap());
        assert!(store.load_all_pages().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_replace_generation() {
        let store = PageStore::open_in_memory().await.unwrap();
        store.save_page(&make_test_page("/old")).await.unwrap();
        store.save_metadata(&make_metadata(30, 7)).await.unwrap();

        let metadata = make_metadata(0, 7);
        store
            .replace_generation(vec![make_test_page("/a"), make_test_page("/b")], &metadata)
            .await
            .unwrap();

        let paths: Vec<String> = store
            .load_all_pages()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.path)
            .collect();
        assert_eq!(paths, vec!["/a", "/b"]);
        assert!(!store.is_stale().await.unwrap());
    }

    #[tokio::test]
    async fn test_replace_generation_failure_keeps_previous() {
        let store = PageStore::open_in_memory().await.unwrap();
        store.save_page(&make_test_page("/old")).await.unwrap();
        store.save_metadata(&make_metadata(1, 7)).await.unwrap();

        store
            .conn
            .call(|conn| {
                conn.execute_batch(
                    "CREATE TRIGGER reject_new BEFORE INSERT ON pages WHEN NEW.path = '/boom'
                     BEGIN SELECT RAISE(ABORT, 'rejected'); END;",
                )
            })
            .await
            .unwrap();

        let result = store
            .replace_generation(vec![make_test_page("/a"), make_test_page("/boom")], &make_metadata(0, 7))
            .await;
        assert!(result.is_err());

        let pages = store.load_all_pages().await.unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].path, "/old");
        assert!(store.exists().await.unwrap());
    }
}
