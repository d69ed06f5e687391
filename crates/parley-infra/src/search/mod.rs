//! Web search backends.

pub mod duckduckgo;

use parley_core::search::backend::BoxSearchBackend;
use parley_types::config::SearchConfig;
use parley_types::search::SearchError;

use self::duckduckgo::DuckDuckGoSearch;

/// Build the configured search backend, or `None` when search is disabled.
pub fn create_search_backend(config: &SearchConfig) -> Result<Option<BoxSearchBackend>, SearchError> {
    if !config.enabled {
        tracing::info!("Web search disabled");
        return Ok(None);
    }
    let backend = DuckDuckGoSearch::new(config)?;
    Ok(Some(BoxSearchBackend::new(backend)))
}
