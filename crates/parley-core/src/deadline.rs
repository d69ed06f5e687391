//! Deadlines for store calls.

use std::future::Future;
use std::time::Duration;

use parley_types::error::RepositoryError;

/// Run a repository call under `limit`, converting both its error and an
/// elapsed deadline into the caller's error type.
pub(crate) async fn bounded<T, E, F>(limit: Duration, on_timeout: E, call: F) -> Result<T, E>
where
    F: Future<Output = Result<T, RepositoryError>>,
    E: From<RepositoryError>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result.map_err(E::from),
        Err(_) => Err(on_timeout),
    }
}
