//! Data structures for search results

use std::fmt;

/// One result item as shown to the reasoning model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    /// Zero-based rank on the results page; also the index `click` accepts.
    pub rank: usize,
    /// Single-line, truncated visible text of the item.
    pub text: String,
}

impl fmt::Display for SearchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}...", self.rank, self.text)
    }
}

/// How a `search` call ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    /// An engine produced results.
    Results {
        engine: &'static str,
        used_fallback: bool,
        items: Vec<SearchResult>,
    },
    /// The requested engine was already the fallback one and found nothing.
    NoResults { engine: &'static str },
    /// Both the requested engine and the fallback engine found nothing.
    Exhausted {
        primary: &'static str,
        fallback: &'static str,
    },
}

impl SearchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, SearchOutcome::Results { .. })
    }
}

impl fmt::Display for SearchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchOutcome::Results {
                engine,
                used_fallback,
                items,
            } => {
                if *used_fallback {
                    write!(f, "[{} (fallback)] search results:", engine)?;
                } else {
                    write!(f, "[{}] search results:", engine)?;
                }
                for item in items {
                    write!(f, "\n{}", item)?;
                }
                Ok(())
            }
            SearchOutcome::NoResults { engine } => {
                write!(f, "Search failed: [{}] returned no results.", engine)
            }
            SearchOutcome::Exhausted { primary, fallback } => write!(
                f,
                "Search failed: neither [{}] nor the fallback engine [{}] returned results.",
                primary, fallback
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn results_render_as_indexed_list() {
        let outcome = SearchOutcome::Results {
            engine: "bing",
            used_fallback: false,
            items: vec![
                SearchResult {
                    rank: 0,
                    text: "Luckin Coffee official site".into(),
                },
                SearchResult {
                    rank: 1,
                    text: "Luckin Coffee - Wikipedia".into(),
                },
            ],
        };
        assert_eq!(
            outcome.to_string(),
            "[bing] search results:\n[0] Luckin Coffee official site...\n[1] Luckin Coffee - Wikipedia..."
        );
    }

    #[test]
    fn fallback_results_are_marked() {
        let outcome = SearchOutcome::Results {
            engine: "duckduckgo",
            used_fallback: true,
            items: vec![],
        };
        assert!(outcome.to_string().starts_with("[duckduckgo (fallback)]"));
        assert!(outcome.is_success());
    }
}
