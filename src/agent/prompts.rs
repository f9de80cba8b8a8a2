//! Instruction preamble sent with every reasoning request

use std::path::Path;

use super::AgentError;

/// Built-in preamble: allowed actions, platform coverage, quoting discipline.
pub const DEFAULT_PREAMBLE: &str = r#"You are a Chief Brand Intelligence Officer. Your client is a business owner who needs market insight with real commercial value.

Workflow, repeated per source: search -> click (pass the result index) -> read -> go_back.
- Spend most of your effort on Weibo, Xiaohongshu and Bilibili; general web search is supporting material.
- On every social platform, read posts from at least five different creators. Prefer the newest and most popular posts.
- If a search engine returns nothing, the search action falls back to DuckDuckGo by itself; you do not need to retry.
- Never click a link you already opened. Always go_back after reading.
- Read at least 5-8 different pages before concluding, and note the URL of every page you read.

For each source, analyse:
1. Sentiment polarity: are users praising or complaining?
2. Pain points: price, usability, looks, service?
3. Purchase intent: are users asking where to buy?
4. Competitors: do users say another brand is better?
Ignore spam and filler comments. Flag content that looks machine-generated.

Quoting discipline:
- Quote users verbatim, in their original language, without changing a single word.
- Tag every quote with its source (e.g. "Xiaohongshu note", "Weibo comment") and keep the link or video title.
- Write reasoned analysis of the social and commercial logic behind the feedback, not bullet lists alone. After the weaknesses, also cover the strengths.

When you have enough material you MUST call generate_report:
- real_quotes: at least 10 verbatim user quotes, one per line, formatted as > "quote" (source: platform user)
- deep_analysis: an analytical essay of about 500 words
- sources: every URL you consulted
Never write the report into the chat; only generate_report produces it."#;

/// The preamble from `path` when given, the built-in one otherwise.
pub fn load_preamble(path: Option<&Path>) -> Result<String, AgentError> {
    match path {
        Some(path) => std::fs::read_to_string(path).map_err(|source| AgentError::Preamble {
            path: path.to_path_buf(),
            source,
        }),
        None => Ok(DEFAULT_PREAMBLE.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_preamble_names_every_action() {
        for action in ["search", "click", "read", "go_back", "generate_report"] {
            assert!(DEFAULT_PREAMBLE.contains(action), "{action}");
        }
        assert_eq!(load_preamble(None).unwrap(), DEFAULT_PREAMBLE);
    }

    #[test]
    fn preamble_file_overrides_default() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, b"Only use bing.").unwrap();
        assert_eq!(load_preamble(Some(file.path())).unwrap(), "Only use bing.");
    }

    #[test]
    fn missing_preamble_file_is_an_error() {
        let err = load_preamble(Some(Path::new("/nonexistent/preamble.txt"))).unwrap_err();
        assert!(matches!(err, AgentError::Preamble { .. }));
    }
}
