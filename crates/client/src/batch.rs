//! Windowed multi-URL fetch on top of the coordinator.

use futures_util::future::join_all;
use linkpeek_core::{BatchFailurePolicy, Metadata, PreviewError};

use crate::coordinator::FetchCoordinator;

impl FetchCoordinator {
    /// Fetch previews for `urls`, `concurrency` at a time.
    ///
    /// URLs are processed in consecutive windows; a window is fully settled
    /// before the next one starts. The output is in input order. Failures
    /// either abort the batch or become [`Metadata::placeholder`] entries,
    /// depending on `policy`.
    pub async fn get_multiple_metadata<S: AsRef<str>>(
        &self, urls: &[S], force_refresh: bool, concurrency: usize, policy: BatchFailurePolicy,
    ) -> Result<Vec<Metadata>, PreviewError> {
        if concurrency == 0 {
            return Err(PreviewError::InvalidInput("concurrency must be at least 1".into()));
        }

        let mut previews = Vec::with_capacity(urls.len());
        for window in urls.chunks(concurrency) {
            let settled = join_all(window.iter().map(|url| self.get_metadata(url.as_ref(), force_refresh))).await;

            for (url, result) in window.iter().zip(settled) {
                let url = url.as_ref();
                match (result, policy) {
                    (Ok(metadata), _) => previews.push(metadata),
                    (Err(e), BatchFailurePolicy::Propagate) => return Err(e),
                    (Err(e), BatchFailurePolicy::Placeholder) => {
                        tracing::warn!("batch preview failed for {url}: {e}");
                        previews.push(Metadata::placeholder(url));
                    }
                }
            }
        }

        Ok(previews)
    }
}
