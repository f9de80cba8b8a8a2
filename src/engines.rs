//! Search engine registry
//!
//! Static table of engine name → query URL template and result-item selector.
//! Lookups never fail: unknown names resolve to [`DEFAULT_ENGINE`].

/// Engine used when the requested name is unknown.
pub const DEFAULT_ENGINE: &str = "bing";

/// Engine retried once when the requested engine yields no results.
pub const FALLBACK_ENGINE: &str = "duckduckgo";

/// Placeholder replaced by the percent-encoded query in URL templates.
const QUERY_PLACEHOLDER: &str = "{query}";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    pub name: &'static str,
    pub url_template: &'static str,
    pub result_selector: &'static str,
}

impl EngineConfig {
    /// Query URL for `query`, percent-encoded.
    pub fn query_url(&self, query: &str) -> String {
        self.url_template
            .replace(QUERY_PLACEHOLDER, &urlencoding::encode(query))
    }

    pub fn is_fallback(&self) -> bool {
        self.name == FALLBACK_ENGINE
    }
}

static ENGINES: &[EngineConfig] = &[
    EngineConfig {
        name: "bing",
        url_template: "https://cn.bing.com/search?q={query}",
        result_selector: "li.b_algo",
    },
    EngineConfig {
        name: "google",
        url_template: "https://www.google.com/search?q={query}",
        result_selector: "div.g",
    },
    EngineConfig {
        name: "bilibili",
        url_template: "https://search.bilibili.com/all?keyword={query}",
        result_selector: ".bili-video-card",
    },
    EngineConfig {
        name: "xiaohongshu",
        url_template: "https://www.xiaohongshu.com/search_result?keyword={query}&source=web_search_result_notes",
        result_selector: ".note-item",
    },
    EngineConfig {
        name: "weibo",
        url_template: "https://s.weibo.com/weibo?q={query}",
        result_selector: ".card-wrap",
    },
    EngineConfig {
        name: "duckduckgo",
        url_template: "https://duckduckgo.com/?q={query}&t=h_&ia=web",
        result_selector: "a[data-testid=\"result-title-a\"]",
    },
];

/// All registered engines, in table order.
pub fn all() -> &'static [EngineConfig] {
    ENGINES
}

/// Exact-name lookup.
pub fn get(name: &str) -> Option<&'static EngineConfig> {
    ENGINES.iter().find(|engine| engine.name == name)
}

/// Resolve a requested engine name, falling back to the default engine.
pub fn resolve(name: &str) -> &'static EngineConfig {
    get(name).unwrap_or_else(default_engine)
}

pub fn default_engine() -> &'static EngineConfig {
    get(DEFAULT_ENGINE).unwrap_or(&ENGINES[0])
}

pub fn fallback_engine() -> &'static EngineConfig {
    get(FALLBACK_ENGINE).unwrap_or(&ENGINES[ENGINES.len() - 1])
}
