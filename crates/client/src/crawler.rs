//! HTTP implementation of the core [`Crawler`] interface.

use async_trait::async_trait;
use docmirror_core::{Crawler, Error, Page, SitemapEntry};

use crate::extract::extract_page;
use crate::fetch::{FetchClient, FetchConfig, url_to_path};
use crate::sitemap::parse_sitemap;

/// Crawls a documentation site through its `/sitemap.xml`.
pub struct HttpCrawler {
    client: FetchClient,
}

impl HttpCrawler {
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        Ok(Self { client: FetchClient::new(config)? })
    }

    pub fn with_client(client: FetchClient) -> Self {
        Self { client }
    }
}

/// Location of the sitemap for `base_url`.
pub fn sitemap_url(base_url: &str) -> String {
    format!("{}/sitemap.xml", base_url.trim_end_matches('/'))
}

#[async_trait]
impl Crawler for HttpCrawler {
    async fn fetch_page_list(&self, base_url: &str) -> Result<Vec<SitemapEntry>, Error> {
        let url = sitemap_url(base_url);
        let response = self
            .client
            .fetch(&url)
            .await
            .map_err(|e| Error::UpstreamUnavailable(format!("{url}: {e}")))?;

        let entries = parse_sitemap(&response.text());
        tracing::info!(url = %url, entries = entries.len(), "fetched sitemap");
        Ok(entries)
    }

    async fn crawl_page(&self, url: &str) -> Result<Page, Error> {
        let fetch_failed = |reason: String| Error::PageFetchFailed { url: url.to_string(), reason };

        let path = url_to_path(url).map_err(|e| fetch_failed(e.to_string()))?;
        let response = self.client.fetch(url).await.map_err(|e| fetch_failed(e.to_string()))?;
        let extracted = extract_page(&response.text());

        Ok(Page {
            path,
            url: url.to_string(),
            title: extracted.title,
            content: extracted.content,
            snippet: extracted.snippet,
        })
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    use super::*;

    /// Serves canned responses keyed by request path until the test ends.
    async fn serve(routes: Vec<(&'static str, u16, &'static str)>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else { return };
                let routes = routes.clone();
                tokio::spawn(async move {
                    let mut buf = vec![0u8; 4096];
                    let n = socket.read(&mut buf).await.unwrap_or(0);
                    let request = String::from_utf8_lossy(&buf[..n]);
                    let path = request.split_whitespace().nth(1).unwrap_or("/").to_string();

                    let (status, body) = routes
                        .iter()
                        .find(|(p, _, _)| *p == path)
                        .map(|(_, s, b)| (*s, *b))
                        .unwrap_or((404, "not found"));
                    let response = format!(
                        "HTTP/1.1 {status} X\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                        body.len()
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
        });

        format!("http://{addr}")
    }

    const SITEMAP: &str = "<urlset><url><loc>http://placeholder/guide/</loc><lastmod>2026-01-05</lastmod></url></urlset>";
    const GUIDE: &str = "<html><head><title>Guide - Docs</title></head><body><nav>Menu</nav><main><h1>Guide</h1><p>Read this first.</p></main></body></html>";

    #[test]
    fn test_sitemap_url() {
        assert_eq!(sitemap_url("https://docs.example.com/"), "https://docs.example.com/sitemap.xml");
        assert_eq!(sitemap_url("https://docs.example.com"), "https://docs.example.com/sitemap.xml");
    }

    #[tokio::test]
    async fn test_fetch_page_list() {
        let base = serve(vec![("/sitemap.xml", 200, SITEMAP)]).await;
        let crawler = HttpCrawler::new(FetchConfig::default()).unwrap();

        let entries = crawler.fetch_page_list(&base).await.unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].lastmod.as_deref(), Some("2026-01-05"));
    }

    #[tokio::test]
    async fn test_fetch_page_list_non_success_is_upstream_unavailable() {
        let base = serve(vec![("/sitemap.xml", 503, "down")]).await;
        let crawler = HttpCrawler::new(FetchConfig::default()).unwrap();

        let result = crawler.fetch_page_list(&base).await;

        assert!(matches!(result, Err(Error::UpstreamUnavailable(_))));
    }

    #[tokio::test]
    async fn test_crawl_page_extracts_fields() {
        let base = serve(vec![("/guide/", 200, GUIDE)]).await;
        let crawler = HttpCrawler::new(FetchConfig::default()).unwrap();
        let url = format!("{base}/guide/");

        let page = crawler.crawl_page(&url).await.unwrap();

        assert_eq!(page.path, "/guide");
        assert_eq!(page.url, url);
        assert_eq!(page.title, "Guide");
        assert_eq!(page.snippet, "Read this first.");
        assert!(!page.content.contains("Menu"));
    }

    #[tokio::test]
    async fn test_crawl_page_missing_is_fetch_failure() {
        let base = serve(Vec::new()).await;
        let crawler = HttpCrawler::new(FetchConfig::default()).unwrap();

        let result = crawler.crawl_page(&format!("{base}/missing/")).await;

        assert!(matches!(result, Err(Error::PageFetchFailed { .. })));
    }
}
