//! Web search result types used by the retrieval gate.

use serde::{Deserialize, Serialize};

/// One title+snippet pair from a results page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub snippet: String,
}

impl SearchHit {
    /// A hit with neither a title nor a snippet carries nothing useful.
    pub fn is_blank(&self) -> bool {
        self.title.trim().is_empty() && self.snippet.trim().is_empty()
    }
}

/// Errors from a search backend.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("search request failed: {0}")]
    Transport(String),

    #[error("search returned status {0}")]
    Status(u16),

    #[error("could not parse search results: {0}")]
    Parse(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_hit() {
        let hit = SearchHit {
            title: "  ".into(),
            snippet: String::new(),
        };
        assert!(hit.is_blank());
        let hit = SearchHit {
            title: String::new(),
            snippet: "body".into(),
        };
        assert!(!hit.is_blank());
    }
}
