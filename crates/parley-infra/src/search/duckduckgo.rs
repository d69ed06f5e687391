//! DuckDuckGo HTML search backend.
//!
//! Fetches the no-JavaScript results page and pulls title+snippet pairs out
//! of each `.result__body` block. The markup is not a stable API, so the
//! patterns are deliberately loose and anything unparseable is skipped.

use regex::Regex;

use parley_core::search::backend::SearchBackend;
use parley_types::config::SearchConfig;
use parley_types::search::{SearchError, SearchHit};

/// Precompiled patterns for the results page.
struct ResultPatterns {
    body: Regex,
    title: Regex,
    snippet: Regex,
    tag: Regex,
}

impl ResultPatterns {
    fn compile() -> Result<Self, regex::Error> {
        Ok(Self {
            body: Regex::new(r#"class="[^"]*\bresult__body\b[^"]*""#)?,
            title: Regex::new(r#"(?s)class="[^"]*\bresult__a\b[^"]*"[^>]*>(.*?)</a>"#)?,
            snippet: Regex::new(
                r#"(?s)class="[^"]*\bresult__snippet\b[^"]*"[^>]*>(.*?)</(?:a|div|td|span)>"#,
            )?,
            tag: Regex::new(r"<[^>]*>")?,
        })
    }
}

pub struct DuckDuckGoSearch {
    client: reqwest::Client,
    endpoint: String,
    patterns: ResultPatterns,
}

impl DuckDuckGoSearch {
    pub fn new(config: &SearchConfig) -> Result<Self, SearchError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout())
            .build()
            .map_err(|e| SearchError::Transport(e.to_string()))?;
        let patterns = ResultPatterns::compile().map_err(|e| SearchError::Parse(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            patterns,
        })
    }

    /// Extract up to `limit` non-blank hits from a results page.
    pub fn parse_results(&self, html: &str, limit: usize) -> Vec<SearchHit> {
        let starts: Vec<usize> = self.patterns.body.find_iter(html).map(|m| m.start()).collect();

        let mut hits = Vec::new();
        for (i, &start) in starts.iter().enumerate() {
            if hits.len() >= limit {
                break;
            }
            let end = starts.get(i + 1).copied().unwrap_or(html.len());
            let block = &html[start..end];

            let hit = SearchHit {
                title: self.capture_text(&self.patterns.title, block),
                snippet: self.capture_text(&self.patterns.snippet, block),
            };
            if !hit.is_blank() {
                hits.push(hit);
            }
        }
        hits
    }

    fn capture_text(&self, pattern: &Regex, block: &str) -> String {
        pattern
            .captures(block)
            .and_then(|c| c.get(1))
            .map(|m| self.inner_text(m.as_str()))
            .unwrap_or_default()
    }

    fn inner_text(&self, fragment: &str) -> String {
        let stripped = self.patterns.tag.replace_all(fragment, "");
        let decoded = stripped
            .replace("&lt;", "<")
            .replace("&gt;", ">")
            .replace("&quot;", "\"")
            .replace("&#x27;", "'")
            .replace("&#39;", "'")
            .replace("&apos;", "'")
            .replace("&nbsp;", " ")
            .replace("&amp;", "&");
        decoded.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}

impl SearchBackend for DuckDuckGoSearch {
    fn name(&self) -> &str {
        "duckduckgo"
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>, SearchError> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("q", query)])
            .send()
            .await
            .map_err(|e| SearchError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::Status(status.as_u16()));
        }

        let html = response
            .text()
            .await
            .map_err(|e| SearchError::Transport(e.to_string()))?;

        let hits = self.parse_results(&html, limit);
        tracing::debug!(hits = hits.len(), "Search results parsed");
        Ok(hits)
    }
}
