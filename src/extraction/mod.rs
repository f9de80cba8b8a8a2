//! Page reading with per-site content expansion
//!
//! `read` first runs the expansion strategy registered for the current host,
//! then the generic expansion, then returns the page text prefixed with its
//! source URL and truncated to a fixed size.

mod strategies;

pub use strategies::{
    ExpandStep, ExpansionStrategy, GenericExpansion, SiteStrategy, builtin_strategies,
};

use tracing::{debug, info};
use url::Url;

use crate::browser::{BrowserResult, PageDriver};
use crate::utils::constants::{PAGE_TEXT_LIMIT, SETTLE_TIMEOUT};
use crate::utils::truncate_chars;

/// Host → expansion strategy table with an always-applied generic fallback.
pub struct StrategyRegistry {
    strategies: Vec<Box<dyn ExpansionStrategy>>,
    fallback: Box<dyn ExpansionStrategy>,
}

impl StrategyRegistry {
    /// Registry without any site strategy.
    pub fn empty() -> Self {
        Self {
            strategies: Vec::new(),
            fallback: Box::new(GenericExpansion),
        }
    }

    /// Register a strategy. Earlier registrations win when several match.
    pub fn register(mut self, strategy: impl ExpansionStrategy + 'static) -> Self {
        self.strategies.push(Box::new(strategy));
        self
    }

    /// First site strategy that applies to `url`, if any.
    pub fn strategy_for(&self, url: &str) -> Option<&dyn ExpansionStrategy> {
        let host = Url::parse(url).ok()?.host_str()?.to_ascii_lowercase();
        self.strategies
            .iter()
            .find(|s| s.matches(&host))
            .map(|s| s.as_ref())
    }

    /// Run the site strategy for `url` (if any), then the generic fallback.
    pub async fn expand(&self, page: &dyn PageDriver, url: &str) -> usize {
        let mut applied = 0;
        if let Some(strategy) = self.strategy_for(url) {
            let n = strategy.expand(page).await;
            debug!("{} expansion applied {} step(s)", strategy.name(), n);
            applied += n;
        }
        let n = self.fallback.expand(page).await;
        debug!("{} expansion applied {} step(s)", self.fallback.name(), n);
        applied + n
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        builtin_strategies()
            .into_iter()
            .fold(Self::empty(), |registry, strategy| registry.register(strategy))
    }
}

/// Expand the current page and return its text, prefixed with the source URL.
pub async fn read(page: &dyn PageDriver, registry: &StrategyRegistry) -> BrowserResult<String> {
    let url = page.url().await?;
    info!("Reading {}", url);

    registry.expand(page, &url).await;
    page.wait_until_settled(SETTLE_TIMEOUT).await?;

    let mut text = page.body_text().await?;
    // Client-rendered pages can report an empty innerText; fall back to the DOM
    if text.trim().is_empty() {
        debug!("Body text empty, converting rendered HTML");
        text = html2md::parse_html(&page.html().await?);
    }

    let url = page.url().await?;
    Ok(render_page_text(&url, &text))
}

/// Format page text for the reasoning model.
///
/// Text over [`PAGE_TEXT_LIMIT`] characters is cut and followed by a notice
/// naming how many characters were dropped.
pub fn render_page_text(url: &str, text: &str) -> String {
    let (kept, omitted) = truncate_chars(text, PAGE_TEXT_LIMIT);
    let mut out = format!("Source: {}\n\n{}", url, kept);
    if omitted > 0 {
        out.push_str(&format!("\n...({} characters omitted)...", omitted));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockElement, MockEvent, MockPage, MockPageState};

    #[test]
    fn registry_dispatches_by_host() {
        let registry = StrategyRegistry::default();
        let name = |url: &str| registry.strategy_for(url).map(|s| s.name().to_string());

        assert_eq!(name("https://www.bilibili.com/video/BV1xx"), Some("bilibili".into()));
        assert_eq!(name("https://www.xiaohongshu.com/explore/1"), Some("xiaohongshu".into()));
        assert_eq!(name("https://weibo.com/123/abc"), Some("weibo".into()));
        assert_eq!(name("https://example.com/?q=weibo.com"), None);
        assert_eq!(name("not a url"), None);
    }

    #[test]
    fn short_text_is_returned_whole() {
        let out = render_page_text("https://example.com/a", "hello");
        assert_eq!(out, "Source: https://example.com/a\n\nhello");
    }

    #[test]
    fn long_text_reports_exact_omission() {
        let total = PAGE_TEXT_LIMIT + 1234;
        let text = "评".repeat(total);
        let out = render_page_text("https://weibo.com/1", &text);

        assert!(out.starts_with("Source: https://weibo.com/1\n"));
        assert!(out.ends_with("\n...(1234 characters omitted)..."));
        let body = out
            .strip_prefix("Source: https://weibo.com/1\n\n")
            .and_then(|rest| rest.strip_suffix("\n...(1234 characters omitted)..."))
            .unwrap();
        assert_eq!(body.chars().count(), PAGE_TEXT_LIMIT);
    }

    #[tokio::test]
    async fn read_prefixes_url_and_runs_site_steps() {
        let page = MockPage::new();
        page.add(
            MockPageState::new("https://www.bilibili.com/")
                .with(".desc-info .toggle-btn", vec![MockElement::new("SPAN", "展开更多")])
                .with_body("UP主: great video\n评论 120"),
        );
        page.open("https://www.bilibili.com/video/BV1xx");

        let out = read(&page, &StrategyRegistry::default()).await.unwrap();

        assert_eq!(
            out,
            "Source: https://www.bilibili.com/video/BV1xx\n\nUP主: great video\n评论 120"
        );
        assert_eq!(page.clicks(), vec!["展开更多".to_string()]);
        assert!(page.events().contains(&MockEvent::ScrollBy(0, 500)));
    }

    #[tokio::test]
    async fn missing_controls_do_not_fail_the_read() {
        let page = MockPage::new();
        page.add(MockPageState::new("https://s.weibo.com/").with_body("post body"));
        page.open("https://s.weibo.com/weibo?q=luckin");

        let out = read(&page, &StrategyRegistry::default()).await.unwrap();

        assert!(out.ends_with("post body"));
        assert!(page.clicks().is_empty());
        assert!(page.events().contains(&MockEvent::ScrollBy(0, 800)));
    }

    #[tokio::test]
    async fn generic_expand_runs_on_unknown_sites() {
        let page = MockPage::new();
        page.add(
            MockPageState::new("https://forum.example.com/")
                .with("button", vec![MockElement::new("BUTTON", "Read more")])
                .with_body("thread"),
        );
        page.open("https://forum.example.com/t/1");

        read(&page, &StrategyRegistry::default()).await.unwrap();
        assert_eq!(page.clicks(), vec!["Read more".to_string()]);
    }

    #[tokio::test]
    async fn empty_body_falls_back_to_rendered_html() {
        let page = MockPage::new();
        page.add(
            MockPageState::new("https://app.example.com/")
                .with_body("   ")
                .with_html("<html><body><p>Rendered by script</p></body></html>"),
        );
        page.open("https://app.example.com/");

        let out = read(&page, &StrategyRegistry::empty()).await.unwrap();
        assert!(out.starts_with("Source: https://app.example.com/\n\n"));
        assert!(out.contains("Rendered by script"));
    }
}
