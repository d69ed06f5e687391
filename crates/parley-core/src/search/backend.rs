//! SearchBackend trait and its object-safe wrapper.
//!
//! Same blanket-impl shape as `BoxLlmProvider`: an RPITIT trait for
//! implementors, an object-safe twin with boxed futures, and a wrapper that
//! delegates.

use std::future::Future;
use std::pin::Pin;

use parley_types::search::{SearchError, SearchHit};

/// A web search surface returning title+snippet pairs from its first page.
///
/// Implementations live in parley-infra (e.g., `DuckDuckGoSearch`).
pub trait SearchBackend: Send + Sync {
    fn name(&self) -> &str;

    /// Up to `limit` non-blank hits, in page order.
    fn search(
        &self,
        query: &str,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<SearchHit>, SearchError>> + Send;
}

/// Object-safe version of [`SearchBackend`].
pub trait SearchBackendDyn: Send + Sync {
    fn name(&self) -> &str;

    fn search_boxed<'a>(
        &'a self,
        query: &'a str,
        limit: usize,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<SearchHit>, SearchError>> + Send + 'a>>;
}

impl<T: SearchBackend> SearchBackendDyn for T {
    fn name(&self) -> &str {
        SearchBackend::name(self)
    }

    fn search_boxed<'a>(
        &'a self,
        query: &'a str,
        limit: usize,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<SearchHit>, SearchError>> + Send + 'a>> {
        Box::pin(self.search(query, limit))
    }
}

/// Type-erased search backend.
pub struct BoxSearchBackend {
    inner: Box<dyn SearchBackendDyn + Send + Sync>,
}

impl BoxSearchBackend {
    pub fn new<T: SearchBackend + 'static>(backend: T) -> Self {
        Self {
            inner: Box::new(backend),
        }
    }

    pub fn name(&self) -> &str {
        self.inner.name()
    }

    pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>, SearchError> {
        self.inner.search_boxed(query, limit).await
    }
}
