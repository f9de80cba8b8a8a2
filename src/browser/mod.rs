//! Browser infrastructure for launching Chrome and driving the active page
//!
//! Every action in the crate talks to the page through [`PageDriver`], a small
//! set of primitives (navigate, query, click, read text, go back). The
//! production implementation is [`ChromePage`] over `chromiumoxide`; tests use
//! an in-memory page.

mod chrome;
mod wrapper;

pub use crate::browser_setup::{download_managed_browser, find_browser_executable};
pub use chrome::ChromePage;
pub use wrapper::{BrowserWrapper, launch_browser, open_session_page};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BrowserError {
    #[error("Failed to find browser executable: {0}")]
    NotFound(String),

    #[error("Failed to launch browser: {0}")]
    LaunchFailed(String),

    #[error("Failed to create page: {0}")]
    PageCreationFailed(String),

    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Timed out after {0:?}: {1}")]
    Timeout(Duration, String),

    #[error("Script evaluation failed: {0}")]
    Script(String),

    #[error("CDP command failed: {0}")]
    Cdp(String),

    #[error("IO error: {0}")]
    IoError(String),
}

pub type BrowserResult<T> = Result<T, BrowserError>;

impl From<chromiumoxide::error::CdpError> for BrowserError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        BrowserError::Cdp(err.to_string())
    }
}

/// Addresses one element on the current page.
///
/// Resolution happens lazily inside the page every time the locator is used,
/// so a locator never goes stale across navigations; it simply stops matching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Locator {
    /// The `nth` (zero-based) match of a CSS selector, in document order.
    Css { selector: String, nth: usize },

    /// The `nth` innermost element whose visible text equals (or contains,
    /// when `exact` is false) `text`.
    Text { text: String, exact: bool, nth: usize },

    /// The closest enclosing `<a>` of another element (the element itself if
    /// it already is an anchor). Matches nothing outside a link.
    AncestorAnchor { inner: Box<Locator> },
}

impl Locator {
    pub fn css(selector: impl Into<String>) -> Self {
        Locator::Css {
            selector: selector.into(),
            nth: 0,
        }
    }

    pub fn css_nth(selector: impl Into<String>, nth: usize) -> Self {
        Locator::Css {
            selector: selector.into(),
            nth,
        }
    }

    pub fn text(text: impl Into<String>, exact: bool) -> Self {
        Locator::Text {
            text: text.into(),
            exact,
            nth: 0,
        }
    }

    pub fn ancestor_anchor(self) -> Self {
        Locator::AncestorAnchor {
            inner: Box::new(self),
        }
    }
}

impl std::fmt::Display for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Locator::Css { selector, nth } => write!(f, "css={selector} >> nth={nth}"),
            Locator::Text { text, exact, nth } => {
                write!(f, "text={text:?} (exact={exact}) >> nth={nth}")
            }
            Locator::AncestorAnchor { inner } => write!(f, "{inner} >> closest=a"),
        }
    }
}

/// Browser-automation capability used by every action.
///
/// Implementations are not reentrant: callers drive one operation at a time
/// and assume nobody else mutates the page in between.
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Navigate to `url` and wait for the initial DOM-ready signal.
    async fn goto(&self, url: &str) -> BrowserResult<()>;

    /// Current page URL (`about:blank` when nothing is loaded).
    async fn url(&self) -> BrowserResult<String>;

    /// Number of elements currently matching a CSS selector.
    async fn count(&self, selector: &str) -> BrowserResult<usize>;

    /// Visible text of the located element; `None` if nothing matches.
    async fn inner_text(&self, locator: &Locator) -> BrowserResult<Option<String>>;

    /// Upper-case tag name of the located element; `None` if nothing matches.
    async fn tag_name(&self, locator: &Locator) -> BrowserResult<Option<String>>;

    /// Attribute value of the located element. Missing element or missing
    /// attribute both yield `None`.
    async fn attribute(&self, locator: &Locator, name: &str) -> BrowserResult<Option<String>>;

    async fn set_attribute(&self, locator: &Locator, name: &str, value: &str) -> BrowserResult<()>;

    /// Whether the located element exists and has a rendered, visible box.
    async fn is_visible(&self, locator: &Locator) -> BrowserResult<bool>;

    /// Wait up to `timeout` for the element to become clickable, then click it.
    async fn click(&self, locator: &Locator, timeout: Duration) -> BrowserResult<()>;

    /// Wait up to `timeout` for the element, then scroll it into view.
    async fn scroll_into_view(&self, locator: &Locator, timeout: Duration) -> BrowserResult<()>;

    async fn scroll_by(&self, x: i64, y: i64) -> BrowserResult<()>;

    async fn viewport_height(&self) -> BrowserResult<i64>;

    async fn press_escape(&self) -> BrowserResult<()>;

    /// `innerText` of the document body.
    async fn body_text(&self) -> BrowserResult<String>;

    /// Rendered HTML of the whole document.
    async fn html(&self) -> BrowserResult<String>;

    /// Navigate one entry back in history.
    async fn go_back(&self) -> BrowserResult<()>;

    /// Wait until the document reports it has finished loading, for at most
    /// `max`. Returns whether the page settled before the ceiling.
    async fn wait_until_settled(&self, max: Duration) -> BrowserResult<bool>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locator_serializes_with_kind_tag() {
        let locator = Locator::css_nth("h3 a", 2).ancestor_anchor();
        let value = serde_json::to_value(&locator).unwrap();
        assert_eq!(value["kind"], "ancestor_anchor");
        assert_eq!(value["inner"]["kind"], "css");
        assert_eq!(value["inner"]["selector"], "h3 a");
        assert_eq!(value["inner"]["nth"], 2);
    }

    #[test]
    fn locator_display_is_readable() {
        assert_eq!(Locator::css("li.b_algo").to_string(), "css=li.b_algo >> nth=0");
        assert_eq!(
            Locator::text("Close", true).to_string(),
            "text=\"Close\" (exact=true) >> nth=0"
        );
    }
}
