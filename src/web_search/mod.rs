//! Web search with a single fallback hop
//!
//! Searches run on the session page against one of the registered engines.
//! Sites frequently block or rate-limit automated queries, so when the
//! requested engine shows no results the search is repeated exactly once on
//! the fallback engine.
//!
//! # Architecture
//! - `types` - Result and outcome types
//! - `search` - Single-engine execution and result extraction

mod search;
mod types;

pub use types::{SearchOutcome, SearchResult};

use tracing::info;

use crate::browser::PageDriver;
use crate::engines;

/// Search `query` on `engine`, falling back once if nothing is found.
///
/// Unknown engine names use the default engine. The fallback hop is skipped
/// when the resolved engine already is the fallback engine.
pub async fn search(page: &dyn PageDriver, query: &str, engine: &str) -> SearchOutcome {
    let primary = engines::resolve(engine);
    if primary.name != engine {
        info!("Unknown engine '{}', using [{}]", engine, primary.name);
    }
    info!("Searching [{}] for: {}", primary.name, query);

    if let Some(items) = search::run_engine(page, primary, query).await {
        info!("[{}] returned {} result(s)", primary.name, items.len());
        return SearchOutcome::Results {
            engine: primary.name,
            used_fallback: false,
            items,
        };
    }

    if primary.is_fallback() {
        return SearchOutcome::NoResults {
            engine: primary.name,
        };
    }

    let fallback = engines::fallback_engine();
    info!(
        "[{}] returned nothing or was blocked, retrying on [{}]",
        primary.name, fallback.name
    );

    match search::run_engine(page, fallback, query).await {
        Some(items) => {
            info!("[{}] returned {} result(s)", fallback.name, items.len());
            SearchOutcome::Results {
                engine: fallback.name,
                used_fallback: true,
                items,
            }
        }
        None => SearchOutcome::Exhausted {
            primary: primary.name,
            fallback: fallback.name,
        },
    }
}
