//! Element polling utility for SPA support
//!
//! Search engines and social sites render their result lists with JavaScript
//! after the DOM-ready signal fires, so presence checks poll with exponential
//! backoff under a hard ceiling instead of sleeping blindly.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use crate::browser::PageDriver;

const INITIAL_POLL_INTERVAL: Duration = Duration::from_millis(100);
const MAX_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Run `probe` until it yields `Some`, or until `timeout` elapses.
///
/// # Polling Strategy
/// - Starts at 100ms intervals
/// - Doubles each retry (exponential backoff)
/// - Caps at 1 second maximum interval
/// - Never sleeps past the deadline
pub async fn poll_with_backoff<T, F, Fut>(timeout: Duration, mut probe: F) -> Option<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Option<T>>,
{
    let deadline = Instant::now() + timeout;
    let mut poll_interval = INITIAL_POLL_INTERVAL;

    loop {
        if let Some(found) = probe().await {
            return Some(found);
        }

        let now = Instant::now();
        if now >= deadline {
            return None;
        }

        tokio::time::sleep(poll_interval.min(deadline - now)).await;
        poll_interval = (poll_interval * 2).min(MAX_POLL_INTERVAL);
    }
}

/// Wait for at least one element matching `selector` to appear.
///
/// Returns `false` on timeout. Query errors (bad selector, page mid-navigation)
/// count as "not yet present" and keep polling.
pub async fn wait_for_element(page: &dyn PageDriver, selector: &str, timeout: Duration) -> bool {
    let found = poll_with_backoff(timeout, || async {
        match page.count(selector).await {
            Ok(n) if n > 0 => Some(n),
            Ok(_) => None,
            Err(e) => {
                debug!("Selector probe '{}' failed: {}", selector, e);
                None
            }
        }
    })
    .await;

    match found {
        Some(n) => {
            debug!("Selector '{}' matched {} element(s)", selector, n);
            true
        }
        None => {
            debug!(
                "Selector '{}' did not appear within {}ms",
                selector,
                timeout.as_millis()
            );
            false
        }
    }
}
