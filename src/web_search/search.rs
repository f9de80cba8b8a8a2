//! Single-engine search execution and result extraction

use tracing::{debug, warn};

use super::types::SearchResult;
use crate::browser::{Locator, PageDriver};
use crate::engines::EngineConfig;
use crate::overlay::dismiss_overlays;
use crate::utils::constants::{MAX_SEARCH_RESULTS, RESULT_TEXT_BUDGET, RESULT_WAIT_TIMEOUT};
use crate::utils::{flatten_line, truncate_chars, wait_for_element};

/// Run `query` against one engine.
///
/// `None` means "no results": navigation failed, the result selector never
/// appeared, or it appeared without any readable items. A block page and a
/// genuinely empty result page are indistinguishable here.
pub(crate) async fn run_engine(
    page: &dyn PageDriver,
    engine: &EngineConfig,
    query: &str,
) -> Option<Vec<SearchResult>> {
    let url = engine.query_url(query);

    if let Err(e) = page.goto(&url).await {
        warn!("[{}] navigation failed: {}", engine.name, e);
        return None;
    }

    dismiss_overlays(page).await;

    if !wait_for_element(page, engine.result_selector, RESULT_WAIT_TIMEOUT).await {
        debug!("[{}] result selector never appeared", engine.name);
        return None;
    }

    let items = extract_results(page, engine.result_selector).await;
    if items.is_empty() {
        debug!("[{}] result selector matched but no item was readable", engine.name);
        return None;
    }
    Some(items)
}

/// Read up to [`MAX_SEARCH_RESULTS`] result items as single-line snippets.
async fn extract_results(page: &dyn PageDriver, selector: &str) -> Vec<SearchResult> {
    let available = match page.count(selector).await {
        Ok(n) => n.min(MAX_SEARCH_RESULTS),
        Err(e) => {
            debug!("Counting results for '{}' failed: {}", selector, e);
            return Vec::new();
        }
    };

    let mut items = Vec::with_capacity(available);
    for rank in 0..available {
        let locator = Locator::css_nth(selector, rank);
        let text = match page.inner_text(&locator).await {
            Ok(Some(text)) => text,
            Ok(None) => break,
            Err(e) => {
                debug!("Reading result {} failed: {}", rank, e);
                break;
            }
        };

        let line = flatten_line(&text);
        let (snippet, _) = truncate_chars(&line, RESULT_TEXT_BUDGET);
        items.push(SearchResult {
            rank,
            text: snippet.to_string(),
        });
    }
    items
}
