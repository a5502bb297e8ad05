//! URL canonicalization and page path derivation.

/// Error type for URL canonicalization failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// Normalize a URL before fetching.
///
/// Trims whitespace, defaults the scheme to `https`, lowercases the host and
/// drops the fragment. The query string is kept as given.
pub fn canonicalize(input: &str) -> Result<url::Url, UrlError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let url_str = if trimmed.contains("://") { trimmed.to_string() } else { format!("https://{trimmed}") };

    let mut parsed = url::Url::parse(&url_str).map_err(|e| UrlError::InvalidUrl(e.to_string()))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlError::UnsupportedScheme(scheme.to_string())),
    }

    if let Some(host) = parsed.host_str().map(str::to_lowercase) {
        parsed.set_host(Some(&host)).map_err(|e| UrlError::InvalidUrl(e.to_string()))?;
    }

    parsed.set_fragment(None);

    Ok(parsed)
}

/// Cache key for a page URL: its path, with a trailing slash removed except
/// for the root.
///
/// `https://docs.example.com/ci-cd/github-actions/` becomes
/// `/ci-cd/github-actions`.
pub fn url_to_path(input: &str) -> Result<String, UrlError> {
    let parsed = url::Url::parse(input.trim()).map_err(|e| UrlError::InvalidUrl(e.to_string()))?;
    let path = parsed.path();
    match path.strip_suffix('/') {
        Some(stripped) if !stripped.is_empty() => Ok(stripped.to_string()),
        _ if path.is_empty() => Ok("/".to_string()),
        _ => Ok(path.to_string()),
    }
}
