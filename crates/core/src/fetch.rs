//! Input retrieval from URLs, files, and stdin.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use reqwest::Client;
use url::Url;

use crate::{LenioError, Result};

/// HTTP client configuration for fetching pages to simplify.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Request timeout in seconds.
    pub timeout: u64,
    /// Custom User-Agent string.
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: 30,
            user_agent: "Mozilla/5.0 (compatible; Lenio/1.0; +https://github.com/stormlightlabs/lenio)".to_string(),
        }
    }
}

/// Retrieve HTML from any supported input designator.
///
/// `"-"` reads stdin, `http://` / `https://` URLs are fetched, anything
/// else is treated as a file path.
pub async fn read_input(input: &str, config: &FetchConfig) -> Result<String> {
    if input == "-" {
        fetch_stdin()
    } else if input.starts_with("http://") || input.starts_with("https://") {
        fetch_url(input, config).await
    } else {
        fetch_file(input)
    }
}

/// Fetches HTML content from a URL.
///
/// Performs an HTTP GET, follows redirects, respects the configured
/// timeout, and sends a browser-like User-Agent for compatibility.
pub async fn fetch_url(url: &str, config: &FetchConfig) -> Result<String> {
    let parsed_url = Url::parse(url).map_err(|e| LenioError::InvalidUrl(e.to_string()))?;

    if !matches!(parsed_url.scheme(), "http" | "https") {
        return Err(LenioError::InvalidUrl(
            "URL must use an http:// or https:// scheme".to_string(),
        ));
    }

    let client = Client::builder()
        .timeout(Duration::from_secs(config.timeout))
        .build()
        .map_err(LenioError::HttpError)?;

    let response = client
        .get(parsed_url)
        .header("User-Agent", &config.user_agent)
        .header(
            "Accept",
            "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
        )
        .header("Accept-Language", "en-US,en;q=0.9")
        .send()
        .await
        .map_err(|e| {
            if e.is_timeout() {
                LenioError::Timeout { seconds: config.timeout }
            } else {
                LenioError::HttpError(e)
            }
        })?;

    let content = response.text().await?;

    Ok(content)
}

/// Reads HTML content from a local file.
///
/// Callers should validate and sanitize the path when accepting user input.
pub fn fetch_file(path: &str) -> Result<String> {
    let path_buf = PathBuf::from(path);

    if !path_buf.exists() {
        Err(LenioError::FileNotFound(path_buf))
    } else {
        fs::read_to_string(&path_buf).map_err(LenioError::from)
    }
}

/// Reads HTML content from standard input until EOF.
pub fn fetch_stdin() -> Result<String> {
    use std::io::{self, Read};

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer).map_err(LenioError::from)?;

    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_config_default() {
        let config = FetchConfig::default();
        assert_eq!(config.timeout, 30);
        assert!(config.user_agent.contains("Lenio"));
    }

    #[test]
    fn test_fetch_url_invalid() {
        let config = FetchConfig::default();
        let result = std::thread::spawn(move || {
            tokio::runtime::Runtime::new()
                .unwrap()
                .block_on(fetch_url("not-a-url", &config))
        })
        .join()
        .unwrap();

        assert!(matches!(result, Err(LenioError::InvalidUrl(_))));
    }

    #[test]
    fn test_fetch_url_rejects_other_schemes() {
        let config = FetchConfig::default();
        let result = std::thread::spawn(move || {
            tokio::runtime::Runtime::new()
                .unwrap()
                .block_on(fetch_url("ftp://example.com/page.html", &config))
        })
        .join()
        .unwrap();

        assert!(matches!(result, Err(LenioError::InvalidUrl(_))));
    }

    #[test]
    fn test_fetch_file_not_found() {
        let result = fetch_file("/nonexistent/path/file.html");
        assert!(matches!(result, Err(LenioError::FileNotFound(_))));
    }

    #[test]
    fn test_read_input_dispatches_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.html");
        std::fs::write(&path, "<html><body>hi</body></html>").unwrap();

        let config = FetchConfig::default();
        let content = std::thread::spawn(move || {
            tokio::runtime::Runtime::new()
                .unwrap()
                .block_on(read_input(path.to_str().unwrap(), &config))
        })
        .join()
        .unwrap()
        .unwrap();

        assert!(content.contains("hi"));
    }
}
