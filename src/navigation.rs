//! Link navigation with one-visit-per-destination discipline
//!
//! Click targets are resolved on the current page either by rank in a unified
//! set of result links or by exact visible text. Every destination is clicked
//! at most once per run and always opens in the current tab.

use std::collections::HashSet;
use std::fmt;
use std::time::Duration;

use tracing::{debug, info};

use crate::browser::{BrowserResult, Locator, PageDriver};
use crate::overlay::dismiss_overlays;
use crate::utils::constants::{LINK_CLICK_TIMEOUT, NAVIGATION_TIMEOUT, SETTLE_TIMEOUT};
use crate::utils::poll_with_backoff;

/// Result links across the supported engines and platforms, in ranked order:
/// headline links, bare headlines, then platform list-item links.
pub const UNIFIED_LINK_SELECTOR: &str = "h3 a, h2 a, h3, a[data-testid='result-title-a'], .bili-video-card a, .note-item a, .card-wrap a";

/// Used when the unified set is empty.
const ANY_LINK_SELECTOR: &str = "a";

/// Destinations already clicked during this run.
///
/// Grow-only: there is no removal.
#[derive(Debug, Default, Clone)]
pub struct VisitedLinks {
    links: HashSet<String>,
}

impl VisitedLinks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, href: &str) -> bool {
        self.links.contains(href)
    }

    /// Record `href`; returns `false` if it was already present.
    pub fn insert(&mut self, href: impl Into<String>) -> bool {
        self.links.insert(href.into())
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickTarget {
    /// Zero-based rank in the unified link set
    Index(usize),
    /// Exact visible text
    Text(String),
}

impl ClickTarget {
    /// A non-negative integer literal is an index; anything else is text.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if !trimmed.is_empty() && trimmed.bytes().all(|b| b.is_ascii_digit()) {
            // Overflowing literals can only ever be out of range
            ClickTarget::Index(trimmed.parse().unwrap_or(usize::MAX))
        } else {
            ClickTarget::Text(raw.to_string())
        }
    }
}

impl fmt::Display for ClickTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClickTarget::Index(idx) => write!(f, "#{}", idx),
            ClickTarget::Text(text) => write!(f, "\"{}\"", text),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickOutcome {
    Navigated { target: ClickTarget, url: String },
    AlreadyVisited { target: ClickTarget, href: String },
    IndexOutOfRange { index: usize, available: usize },
    TextNotFound { text: String },
}

impl fmt::Display for ClickOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClickOutcome::Navigated { target, url } => {
                write!(f, "Clicked {}; now on the detail page: {}", target, url)
            }
            ClickOutcome::AlreadyVisited { target, href } => write!(
                f,
                "Refused: {} points to {} which was already visited. Pick a different result.",
                target, href
            ),
            ClickOutcome::IndexOutOfRange { index, available } => write!(
                f,
                "Click failed: index {} is out of range ({} link(s) on this page).",
                index, available
            ),
            ClickOutcome::TextNotFound { text } => {
                write!(f, "Click failed: no element with text \"{}\" on this page.", text)
            }
        }
    }
}

/// Click a result link by index or by text.
///
/// The destination is recorded in `visited` before the click is issued, so a
/// failed or slow click still counts as a visit.
pub async fn click(
    page: &dyn PageDriver,
    visited: &mut VisitedLinks,
    raw_target: &str,
) -> BrowserResult<ClickOutcome> {
    let target = ClickTarget::parse(raw_target);
    info!("Clicking {}", target);

    let locator = match resolve_target(page, &target).await? {
        Ok(locator) => locator,
        Err(refusal) => return Ok(refusal),
    };

    match page.attribute(&locator, "href").await? {
        Some(href) => {
            if visited.contains(&href) {
                info!("Refusing to revisit {}", href);
                return Ok(ClickOutcome::AlreadyVisited { target, href });
            }
            visited.insert(href);
        }
        None => debug!("{} has no href; not tracked as visited", locator),
    }

    let before = page.url().await?;
    page.set_attribute(&locator, "target", "_self").await?;
    page.click(&locator, LINK_CLICK_TIMEOUT).await?;

    if !wait_for_url_change(page, &before, NAVIGATION_TIMEOUT).await {
        debug!("Still on {} after {:?}", before, NAVIGATION_TIMEOUT);
    }
    if !page.wait_until_settled(SETTLE_TIMEOUT).await? {
        debug!("Page still loading after {:?}", SETTLE_TIMEOUT);
    }
    dismiss_overlays(page).await;

    let url = page.url().await?;
    info!("Landed on {}", url);
    Ok(ClickOutcome::Navigated { target, url })
}

/// Locate the element to click, or the refusal to report instead.
async fn resolve_target(
    page: &dyn PageDriver,
    target: &ClickTarget,
) -> BrowserResult<Result<Locator, ClickOutcome>> {
    match target {
        ClickTarget::Index(index) => {
            let mut selector = UNIFIED_LINK_SELECTOR;
            let mut available = page.count(selector).await?;
            if available == 0 {
                selector = ANY_LINK_SELECTOR;
                available = page.count(selector).await?;
            }

            if *index >= available {
                return Ok(Err(ClickOutcome::IndexOutOfRange {
                    index: *index,
                    available,
                }));
            }

            Ok(Ok(enclosing_link(page, Locator::css_nth(selector, *index)).await?))
        }
        ClickTarget::Text(text) => {
            let locator = Locator::text(text.as_str(), true);
            if page.inner_text(&locator).await?.is_none() {
                return Ok(Err(ClickOutcome::TextNotFound { text: text.clone() }));
            }
            Ok(Ok(enclosing_link(page, locator).await?))
        }
    }
}

/// The link a matched element belongs to.
///
/// Headlines, cards and text spans usually sit inside the actual `<a>`; the
/// anchor carries the destination and the `target` to override. Elements with
/// no enclosing anchor are clicked as they are.
async fn enclosing_link(page: &dyn PageDriver, locator: Locator) -> BrowserResult<Locator> {
    let tag = match page.tag_name(&locator).await? {
        Some(tag) if tag != "A" => tag,
        _ => return Ok(locator),
    };

    let anchor = locator.clone().ancestor_anchor();
    if page.tag_name(&anchor).await?.is_some() {
        debug!("{} is a <{}>, using its enclosing link", locator, tag);
        Ok(anchor)
    } else {
        debug!("{} is a <{}> outside any link", locator, tag);
        Ok(locator)
    }
}

/// Wait until the page URL differs from `before`, for at most `max`.
///
/// Right after a click the previous document is still loaded and already
/// reports itself complete, so the URL is the first reliable sign that the
/// navigation committed.
async fn wait_for_url_change(page: &dyn PageDriver, before: &str, max: Duration) -> bool {
    poll_with_backoff(max, || async {
        match page.url().await {
            Ok(url) if url != before => Some(()),
            Ok(_) => None,
            Err(e) => {
                debug!("Reading URL after click failed: {}", e);
                None
            }
        }
    })
    .await
    .is_some()
}

/// Scroll one viewport down (`"down"`) or up (anything else).
pub async fn scroll(page: &dyn PageDriver, direction: &str) -> BrowserResult<String> {
    let height = page.viewport_height().await?;
    let (dy, label) = if direction == "down" {
        (height, "down")
    } else {
        (-height, "up")
    };
    info!("Scrolling {} by {}px", label, height);

    page.scroll_by(0, dy).await?;
    page.wait_until_settled(SETTLE_TIMEOUT).await?;
    Ok(format!("Scrolled {} one screen.", label))
}

/// Navigate one step back in history.
pub async fn go_back(page: &dyn PageDriver) -> BrowserResult<String> {
    info!("Going back");
    page.go_back().await?;
    page.wait_until_settled(SETTLE_TIMEOUT).await?;
    let url = page.url().await?;
    Ok(format!("Went back to the previous page: {}", url))
}
