//! Shared configuration constants for the research actions
//!
//! This module contains the fixed limits and timings the actions rely on, so
//! the numbers that shape what the reasoning model sees live in one place.

use std::time::Duration;

/// Chrome user agent string for stealth mode
///
/// Updated: 2025-01-29 to Chrome 132 (current stable)
/// Next update: 2025-04-29 (quarterly schedule)
///
/// Chrome releases new stable versions ~every 4 weeks.
/// Update quarterly to stay within reasonable version window.
///
/// Reference: https://chromiumdash.appspot.com/schedule
pub const CHROME_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.6834.160 Safari/537.36";

/// Maximum number of result items returned by one search
pub const MAX_SEARCH_RESULTS: usize = 8;

/// Characters kept from each search result's text
pub const RESULT_TEXT_BUDGET: usize = 100;

/// How long a search waits for the engine's result selector
pub const RESULT_WAIT_TIMEOUT: Duration = Duration::from_secs(3);

/// Characters of page text returned by `read`
pub const PAGE_TEXT_LIMIT: usize = 10_000;

/// Per-attempt ceiling for clicking a popup close control
pub const OVERLAY_CLICK_TIMEOUT: Duration = Duration::from_secs(3);

/// Ceiling for clicking the chosen link
pub const LINK_CLICK_TIMEOUT: Duration = Duration::from_secs(5);

/// Ceiling for a clicked link's navigation to commit
pub const NAVIGATION_TIMEOUT: Duration = Duration::from_secs(5);

/// Ceiling for the post-navigation settle check
pub const SETTLE_TIMEOUT: Duration = Duration::from_secs(1);

/// Ceiling for each best-effort expand click while reading
pub const EXPAND_CLICK_TIMEOUT: Duration = Duration::from_millis(500);

/// Ceiling for scrolling a comments section into view while reading
pub const EXPAND_SCROLL_TIMEOUT: Duration = Duration::from_secs(1);
