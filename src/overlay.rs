//! Best-effort dismissal of modals, cookie banners and login popups
//!
//! Every attempt is time-bounded and failure-tolerant: a missing close button
//! is the common case, not an error.

use tracing::debug;

use crate::browser::{Locator, PageDriver};
use crate::utils::constants::OVERLAY_CLICK_TIMEOUT;

/// Visible texts of controls that close an overlay.
pub const CLOSE_TEXTS: &[&str] = &[
    "关闭",
    "Close",
    "No thanks",
    "Not now",
    "Maybe later",
    "以后再说",
    "跳过",
    "Skip",
    "I accept",
    "Accept all",
    "同意",
    "知道啦",
    "×",
    "x",
    "确定",
    "Confirm",
];

/// Selectors of common close buttons.
pub const CLOSE_SELECTORS: &[&str] = &[
    "button[aria-label='Close']",
    "div[aria-label='Close']",
    ".close-btn",
    ".modal-close",
    "svg.close-icon",
    ".close",
];

/// Sweep the current page for overlays and close what is found.
///
/// Clicks the first visible match of each known close text and selector,
/// then sends one Escape key press. Returns the number of controls clicked.
pub async fn dismiss_overlays(page: &dyn PageDriver) -> usize {
    let candidates = CLOSE_TEXTS
        .iter()
        .map(|text| Locator::text(*text, true))
        .chain(CLOSE_SELECTORS.iter().map(|selector| Locator::css(*selector)));

    let mut dismissed = 0;
    for locator in candidates {
        if try_click(page, &locator).await {
            dismissed += 1;
        }
    }

    if let Err(e) = page.press_escape().await {
        debug!("Escape key press failed: {}", e);
    }

    if dismissed > 0 {
        debug!("Dismissed {} overlay control(s)", dismissed);
    }
    dismissed
}

async fn try_click(page: &dyn PageDriver, locator: &Locator) -> bool {
    match page.is_visible(locator).await {
        Ok(true) => {}
        Ok(false) => return false,
        Err(e) => {
            debug!("Visibility probe for {} failed: {}", locator, e);
            return false;
        }
    }

    match page.click(locator, OVERLAY_CLICK_TIMEOUT).await {
        Ok(()) => true,
        Err(e) => {
            debug!("Overlay control {} not clicked: {}", locator, e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockElement, MockEvent, MockPage};

    #[tokio::test]
    async fn clean_page_only_sends_escape() {
        let page = MockPage::new();
        page.add_page("https://example.com/", vec![]);
        page.goto("https://example.com/").await.unwrap();

        assert_eq!(dismiss_overlays(&page).await, 0);
        assert!(page.clicks().is_empty());
        assert_eq!(page.events().last(), Some(&MockEvent::Escape));
    }

    #[tokio::test]
    async fn clicks_visible_close_controls() {
        let page = MockPage::new();
        page.add_page(
            "https://www.xiaohongshu.com/",
            vec![
                ("div.popup", vec![MockElement::new("SPAN", "以后再说")]),
                (".close-btn", vec![MockElement::new("I", "")]),
                ("div.banner", vec![MockElement::new("BUTTON", "Accept all").hidden()]),
            ],
        );
        page.goto("https://www.xiaohongshu.com/explore").await.unwrap();

        assert_eq!(dismiss_overlays(&page).await, 2);
        assert_eq!(page.clicks(), vec!["以后再说".to_string(), String::new()]);
    }
}
