//! Page CRUD operations.
//!
//! Each page is a single row keyed by its site-relative path; saving the
//! same path again overwrites the previous content.

use super::connection::PageStore;
use crate::Error;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// One documentation page's extracted content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct Page {
    /// Canonical site-relative path, e.g. `/getting-started`.
    pub path: String,
    /// Absolute source URL.
    pub url: String,
    pub title: String,
    /// Full extracted body, markdown-like.
    pub content: String,
    /// Short excerpt for result display.
    pub snippet: String,
}

pub(crate) const UPSERT_PAGE_SQL: &str = "INSERT INTO pages (path, url, title, content, snippet)
    VALUES (?1, ?2, ?3, ?4, ?5)
    ON CONFLICT(path) DO UPDATE SET
        url = excluded.url,
        title = excluded.title,
        content = excluded.content,
        snippet = excluded.snippet";

const SELECT_PAGE_COLUMNS: &str = "SELECT path, url, title, content, snippet FROM pages";

fn page_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Page> {
    Ok(Page {
        path: row.get(0)?,
        url: row.get(1)?,
        title: row.get(2)?,
        content: row.get(3)?,
        snippet: row.get(4)?,
    })
}

pub(crate) fn upsert_page(conn: &rusqlite::Connection, page: &Page) -> Result<(), Error> {
    conn.execute(UPSERT_PAGE_SQL, params![&page.path, &page.url, &page.title, &page.content, &page.snippet])?;
    Ok(())
}

impl PageStore {
    /// Insert or replace the page stored under `page.path`.
    pub async fn save_page(&self, page: &Page) -> Result<(), Error> {
        let page = page.clone();
        self.conn
            .call(move |conn| -> Result<(), Error> { upsert_page(conn, &page) })
            .await
            .map_err(Error::from)
    }

    /// Get a page by its exact path.
    ///
    /// Returns None if no page is stored under that path.
    pub async fn load_page(&self, path: &str) -> Result<Option<Page>, Error> {
        let path = path.to_string();
        self.conn
            .call(move |conn| -> Result<Option<Page>, Error> {
                let mut stmt = conn.prepare(&format!("{SELECT_PAGE_COLUMNS} WHERE path = ?1"))?;

                match stmt.query_row(params![path], page_from_row) {
                    Ok(page) => Ok(Some(page)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Load every stored page, ordered by path.
    ///
    /// Returns an empty vector when nothing has been saved yet.
    pub async fn load_all_pages(&self) -> Result<Vec<Page>, Error> {
        self.conn
            .call(move |conn| -> Result<Vec<Page>, Error> {
                let mut stmt = conn.prepare(&format!("{SELECT_PAGE_COLUMNS} ORDER BY path"))?;
                let pages = stmt
                    .query_map([], page_from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(pages)
            })
            .await
            .map_err(Error::from)
    }

    /// Number of stored pages.
    pub async fn page_count(&self) -> Result<u64, Error> {
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 = conn.query_row("SELECT COUNT(*) FROM pages", [], |row| row.get(0))?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn make_test_page(path: &str) -> Page {
        Page {
            path: path.to_string(),
            url: format!("https://docs.example.com{path}"),
            title: format!("Title for {path}"),
            content: format!("# Heading\n\nBody of {path}"),
            snippet: format!("Body of {path}"),
        }
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let store = PageStore::open_in_memory().await.unwrap();
        let page = make_test_page("/getting-started");

        store.save_page(&page).await.unwrap();

        let loaded = store.load_page("/getting-started").await.unwrap().unwrap();
        assert_eq!(loaded, page);
    }

    #[tokio::test]
    async fn test_load_missing() {
        let store = PageStore::open_in_memory().await.unwrap();
        assert!(store.load_page("/nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_overwrites_same_path() {
        let store = PageStore::open_in_memory().await.unwrap();
        store.save_page(&make_test_page("/a")).await.unwrap();

        let updated = Page { title: "Updated".into(), ..make_test_page("/a") };
        store.save_page(&updated).await.unwrap();

        assert_eq!(store.load_page("/a").await.unwrap().unwrap().title, "Updated");
        assert_eq!(store.page_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_load_all_empty() {
        let store = PageStore::open_in_memory().await.unwrap();
        assert!(store.load_all_pages().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_load_all_sorted_by_path() {
        let store = PageStore::open_in_memory().await.unwrap();
        for path in ["/b", "/a/c", "/a"] {
            store.save_page(&make_test_page(path)).await.unwrap();
        }

        let paths: Vec<String> = store
            .load_all_pages()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.path)
            .collect();
        assert_eq!(paths, vec!["/a", "/a/c", "/b"]);
    }

    #[tokio::test]
    async fn test_corrupt_page_row() {
        let store = PageStore::open_in_memory().await.unwrap();
        store
            .conn
            .call(|conn| {
                conn.execute(
                    "INSERT INTO pages (path, url, title, content, snippet) VALUES ('/bad', 'u', X'00FF', 'c', 's')",
                    [],
                )
            })
            .await
            .unwrap();

        let result = store.load_page("/bad").await;
        assert!(matches!(result, Err(Error::CorruptData(_))));
    }
}
