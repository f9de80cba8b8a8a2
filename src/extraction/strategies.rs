//! Per-site expansion procedures
//!
//! Each platform hides long-form text and comments behind its own controls.
//! A strategy is a short list of best-effort steps; a step that finds nothing
//! to act on is logged and skipped.

use async_trait::async_trait;
use tracing::debug;

use crate::browser::{Locator, PageDriver};
use crate::utils::constants::{EXPAND_CLICK_TIMEOUT, EXPAND_SCROLL_TIMEOUT, SETTLE_TIMEOUT};

/// Reveals hidden or lazily loaded content on the current page.
#[async_trait]
pub trait ExpansionStrategy: Send + Sync {
    fn name(&self) -> &str;

    /// Whether this strategy applies to pages on `host`.
    fn matches(&self, host: &str) -> bool;

    /// Run the expansion. Returns how many steps had an effect.
    async fn expand(&self, page: &dyn PageDriver) -> usize;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpandStep {
    /// Click the first match of a CSS selector
    ClickSelector(&'static str),
    /// Click the first element whose text equals (or contains) `text`
    ClickText { text: &'static str, exact: bool },
    /// Scroll the window down by a fixed offset to trigger lazy loading
    ScrollBy(i64),
    /// Bring the first match of a selector into view
    ScrollIntoView(&'static str),
    /// Wait for the page to report it has finished loading
    Settle,
}

impl ExpandStep {
    /// Run one step; `false` when there was nothing to act on.
    pub async fn apply(&self, page: &dyn PageDriver) -> bool {
        let result = match self {
            ExpandStep::ClickSelector(selector) => {
                page.click(&Locator::css(*selector), EXPAND_CLICK_TIMEOUT).await
            }
            ExpandStep::ClickText { text, exact } => {
                page.click(&Locator::text(*text, *exact), EXPAND_CLICK_TIMEOUT).await
            }
            ExpandStep::ScrollBy(dy) => page.scroll_by(0, *dy).await,
            ExpandStep::ScrollIntoView(selector) => {
                page.scroll_into_view(&Locator::css(*selector), EXPAND_SCROLL_TIMEOUT)
                    .await
            }
            ExpandStep::Settle => page.wait_until_settled(SETTLE_TIMEOUT).await.map(|_| ()),
        };

        match result {
            Ok(()) => true,
            Err(e) => {
                debug!("Expand step {:?} skipped: {}", self, e);
                false
            }
        }
    }
}

/// A fixed step list bound to one site's host.
#[derive(Debug, Clone)]
pub struct SiteStrategy {
    name: &'static str,
    /// Registrable domain; subdomains match too
    domain: &'static str,
    steps: &'static [ExpandStep],
}

impl SiteStrategy {
    pub const fn new(name: &'static str, domain: &'static str, steps: &'static [ExpandStep]) -> Self {
        Self { name, domain, steps }
    }
}

#[async_trait]
impl ExpansionStrategy for SiteStrategy {
    fn name(&self) -> &str {
        self.name
    }

    fn matches(&self, host: &str) -> bool {
        host == self.domain
            || host
                .strip_suffix(self.domain)
                .is_some_and(|prefix| prefix.ends_with('.'))
    }

    async fn expand(&self, page: &dyn PageDriver) -> usize {
        run_steps(page, self.steps).await
    }
}

/// Applies on every page, after any site strategy.
#[derive(Debug, Clone, Default)]
pub struct GenericExpansion;

#[async_trait]
impl ExpansionStrategy for GenericExpansion {
    fn name(&self) -> &str {
        "generic"
    }

    fn matches(&self, _host: &str) -> bool {
        true
    }

    async fn expand(&self, page: &dyn PageDriver) -> usize {
        run_steps(page, GENERIC_STEPS).await
    }
}

async fn run_steps(page: &dyn PageDriver, steps: &[ExpandStep]) -> usize {
    let mut applied = 0;
    for step in steps {
        if step.apply(page).await {
            applied += 1;
        }
    }
    applied
}

pub const BILIBILI_STEPS: &[ExpandStep] = &[
    ExpandStep::ClickSelector(".desc-info .toggle-btn"),
    ExpandStep::ScrollBy(500),
];

pub const XIAOHONGSHU_STEPS: &[ExpandStep] = &[
    ExpandStep::ClickSelector(".content-container .expand-btn"),
    ExpandStep::ScrollIntoView(".comments-container"),
];

pub const WEIBO_STEPS: &[ExpandStep] = &[
    ExpandStep::ClickSelector("a[action-type='fl_unfold']"),
    ExpandStep::ClickText {
        text: "评论",
        exact: false,
    },
    ExpandStep::ScrollBy(800),
    ExpandStep::Settle,
    ExpandStep::ClickText {
        text: "查看更多",
        exact: false,
    },
];

pub const GENERIC_STEPS: &[ExpandStep] = &[
    ExpandStep::ClickText {
        text: "展开",
        exact: true,
    },
    ExpandStep::ClickText {
        text: "Show more",
        exact: true,
    },
    ExpandStep::ClickText {
        text: "Read more",
        exact: true,
    },
];

/// Strategies for the supported social and video platforms.
pub fn builtin_strategies() -> Vec<SiteStrategy> {
    vec![
        SiteStrategy::new("bilibili", "bilibili.com", BILIBILI_STEPS),
        SiteStrategy::new("xiaohongshu", "xiaohongshu.com", XIAOHONGSHU_STEPS),
        SiteStrategy::new("weibo", "weibo.com", WEIBO_STEPS),
    ]
}
