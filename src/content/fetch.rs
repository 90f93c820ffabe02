//! Content fetcher for web pages and YouTube transcripts.

use std::time::Duration;

use regex::Regex;
use reqwest::Client;
use thiserror::Error;
use url::Url;

use crate::config::FetchConfig;
use crate::content::extract_page_text;
use crate::store::ContentKind;

/// Errors from content fetching.
#[derive(Error, Debug)]
pub enum ContentError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error("Fetch failed: {0}")]
    Fetch(String),
    #[error("HTTP {status} fetching {url}")]
    Status { status: u16, url: String },
    #[error("No transcript available for video {0}")]
    NoTranscript(String),
}

/// Raw fetched content, before LLM processing.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedContent {
    pub kind: ContentKind,
    pub url: Option<String>,
    pub title: String,
    pub content: String,
}

/// Fetches and parses content with a fixed timeout and a single retry.
pub struct ContentFetcher {
    client: Client,
    config: FetchConfig,
}

impl ContentFetcher {
    /// Create a fetcher from configuration.
    #[must_use]
    pub fn new(config: FetchConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("Failed to build HTTP client");
        Self { client, config }
    }

    /// The fetch configuration in use.
    #[must_use]
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Fetch content from a raw user input.
    ///
    /// URLs are dispatched by host (YouTube gets transcript handling, anything
    /// else is fetched as a web page); non-URL input is treated as plain text.
    ///
    /// # Errors
    ///
    /// Returns `ContentError` if a network fetch fails.
    pub async fn fetch(&self, input: &str) -> Result<FetchedContent, ContentError> {
        let trimmed = input.trim();
        if let Ok(url) = Url::parse(trimmed) {
            if matches!(url.scheme(), "http" | "https") {
                if let Some(video_id) = youtube_video_id(trimmed) {
                    return self.fetch_youtube(trimmed, &video_id).await;
                }
                return self.fetch_webpage(trimmed).await;
            }
        }
        Ok(self.plain_text(trimmed))
    }

    /// Wrap pasted text as a content item.
    #[must_use]
    pub fn plain_text(&self, text: &str) -> FetchedContent {
        let title: String = text.split_whitespace().take(8).collect::<Vec<_>>().join(" ");
        let title = if title.is_empty() {
            "Pasted text".to_string()
        } else {
            title
        };
        FetchedContent {
            kind: ContentKind::Text,
            url: None,
            title,
            content: truncate(text, self.config.max_content_len),
        }
    }

    /// Fetch and parse a web page.
    ///
    /// # Errors
    ///
    /// Returns `ContentError` on network failure or a non-success status.
    pub async fn fetch_webpage(&self, url: &str) -> Result<FetchedContent, ContentError> {
        let body = self.get_with_retry(url).await?;
        let page = extract_page_text(&body);

        let mut content = page.text;
        if let Some(description) = page.description {
            content = format!("{description}\n{content}");
        }

        Ok(FetchedContent {
            kind: ContentKind::Webpage,
            url: Some(url.to_string()),
            title: page.title,
            content: truncate(&content, self.config.max_content_len),
        })
    }

    /// Fetch a YouTube transcript from the timedtext endpoint.
    async fn fetch_youtube(
        &self,
        url: &str,
        video_id: &str,
    ) -> Result<FetchedContent, ContentError> {
        let transcript_url =
            format!("https://video.google.com/timedtext?lang=en&v={video_id}");
        let body = self.get_with_retry(&transcript_url).await?;
        let transcript = strip_caption_xml(&body);

        if transcript.is_empty() {
            return Err(ContentError::NoTranscript(video_id.to_string()));
        }

        Ok(FetchedContent {
            kind: ContentKind::YoutubeVideo,
            url: Some(url.to_string()),
            title: format!("YouTube video {video_id}"),
            content: truncate(&transcript, self.config.max_content_len),
        })
    }

    /// GET with a single retry on failure.
    async fn get_with_retry(&self, url: &str) -> Result<String, ContentError> {
        match self.get_once(url).await {
            Ok(body) => Ok(body),
            Err(first) => {
                tracing::warn!(url, error = %first, "Fetch failed, retrying once");
                self.get_once(url).await
            }
        }
    }

    async fn get_once(&self, url: &str) -> Result<String, ContentError> {
        let response = self
            .client
            .get(url)
            .header("User-Agent", "eumicus/0.1 (personal knowledge assistant)")
            .send()
            .await
            .map_err(|e| ContentError::Fetch(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ContentError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        response
            .text()
            .await
            .map_err(|e| ContentError::Fetch(e.to_string()))
    }
}

/// Extract a YouTube video id from watch, share, or shorts URLs.
#[must_use]
pub fn youtube_video_id(url: &str) -> Option<String> {
    let re = Regex::new(
        r"(?:youtube\.com/(?:watch\?v=|shorts/)|youtu\.be/)([A-Za-z0-9_-]{11})",
    )
    .expect("static regex must compile");
    re.captures(url).map(|c| c[1].to_string())
}

/// Strip timedtext XML down to caption text.
fn strip_caption_xml(xml: &str) -> String {
    let tag = Regex::new(r"<[^>]+>").expect("static regex must compile");
    let text = tag.replace_all(xml, " ");
    let text = text
        .replace("&amp;", "&")
        .replace("&#39;", "'")
        .replace("&quot;", "\"")
        .replace("&lt;", "<")
        .replace("&gt;", ">");
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Truncate to a character cap on a char boundary.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        s.chars().take(max_len).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_youtube_video_id_watch_url() {
        assert_eq!(
            youtube_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
    }

    #[test]
    fn test_youtube_video_id_short_url() {
        assert_eq!(
            youtube_video_id("https://youtu.be/dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
    }

    #[test]
    fn test_youtube_video_id_shorts() {
        assert_eq!(
            youtube_video_id("https://youtube.com/shorts/abcDEF12345"),
            Some("abcDEF12345".to_string())
        );
    }

    #[test]
    fn test_youtube_video_id_non_youtube() {
        assert!(youtube_video_id("https://example.com/watch?v=dQw4w9WgXcQ").is_none());
    }

    #[test]
    fn test_strip_caption_xml() {
        let xml = r#"<transcript><text start="0" dur="2">Hello &amp; welcome</text><text start="2" dur="3">to the course</text></transcript>"#;
        assert_eq!(strip_caption_xml(xml), "Hello & welcome to the course");
    }

    #[test]
    fn test_truncate_respects_cap() {
        assert_eq!(truncate("abcdef", 4), "abcd");
        assert_eq!(truncate("abc", 4), "abc");
    }

    #[tokio::test]
    async fn test_plain_text_input() {
        let fetcher = ContentFetcher::new(FetchConfig::default());
        let fetched = fetcher.fetch("Ownership moves values between bindings.").await.unwrap();

        assert_eq!(fetched.kind, ContentKind::Text);
        assert!(fetched.url.is_none());
        assert!(fetched.title.starts_with("Ownership moves"));
    }

    #[tokio::test]
    async fn test_empty_text_gets_default_title() {
        let fetcher = ContentFetcher::new(FetchConfig::default());
        let fetched = fetcher.fetch("").await.unwrap();
        assert_eq!(fetched.title, "Pasted text");
    }

    #[test]
    fn test_plain_text_truncated_to_cap() {
        let config = FetchConfig {
            max_content_len: 10,
            ..FetchConfig::default()
        };
        let fetcher = ContentFetcher::new(config);
        let fetched = fetcher.plain_text("a very long body of pasted text");
        assert_eq!(fetched.content.chars().count(), 10);
    }
}
