//! In-memory `PageDriver` for unit tests
//!
//! Pages are registered by URL prefix; navigating to a URL loads the page with
//! the longest matching prefix (or an empty page). Every interaction is
//! recorded so tests can assert on what the actions did to the browser.

use async_trait::async_trait;
use parking_lot::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;

use crate::browser::{BrowserError, BrowserResult, Locator, PageDriver};

#[derive(Debug, Clone, PartialEq)]
pub struct MockElement {
    pub tag: String,
    pub text: String,
    pub href: Option<String>,
    pub visible: bool,
    /// Enclosing anchor, for heading-inside-link layouts
    pub anchor: Option<Box<MockElement>>,
}

impl MockElement {
    pub fn new(tag: &str, text: &str) -> Self {
        Self {
            tag: tag.to_uppercase(),
            text: text.to_string(),
            href: None,
            visible: true,
            anchor: None,
        }
    }

    pub fn link(text: &str, href: &str) -> Self {
        Self::new("A", text).with_href(href)
    }

    pub fn with_href(mut self, href: &str) -> Self {
        self.href = Some(href.to_string());
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn inside_anchor(mut self, href: &str) -> Self {
        self.anchor = Some(Box::new(MockElement::link(&self.text, href)));
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct MockPageState {
    url_prefix: String,
    elements: Vec<(String, Vec<MockElement>)>,
    body: String,
    html: String,
}

impl MockPageState {
    pub fn new(url_prefix: &str) -> Self {
        Self {
            url_prefix: url_prefix.to_string(),
            ..Default::default()
        }
    }

    pub fn with(mut self, selector: &str, elements: Vec<MockElement>) -> Self {
        self.elements.push((selector.to_string(), elements));
        self
    }

    pub fn with_body(mut self, body: &str) -> Self {
        self.body = body.to_string();
        self
    }

    pub fn with_html(mut self, html: &str) -> Self {
        self.html = html.to_string();
        self
    }

    fn matching(&self, selector: &str) -> &[MockElement] {
        self.elements
            .iter()
            .find(|(sel, _)| sel == selector)
            .map(|(_, els)| els.as_slice())
            .unwrap_or(&[])
    }

    fn all_elements(&self) -> impl Iterator<Item = &MockElement> {
        self.elements.iter().flat_map(|(_, els)| els.iter())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MockEvent {
    Goto(String),
    Click(String),
    ScrollIntoView(String),
    ScrollBy(i64, i64),
    Escape,
    GoBack,
    SetAttribute(String, String, String),
}

#[derive(Default)]
struct Inner {
    pages: Vec<MockPageState>,
    current: Option<usize>,
    current_url: String,
    history: Vec<String>,
    events: Vec<MockEvent>,
    /// How long a clicked link takes to commit its navigation
    navigation_delay: Duration,
    pending: Option<(Instant, String)>,
}

impl Inner {
    /// Commit a delayed navigation whose time has come.
    fn catch_up(&mut self) {
        let due = matches!(&self.pending, Some((at, _)) if Instant::now() >= *at);
        if due && let Some((_, url)) = self.pending.take() {
            self.navigate(&url);
        }
    }

    fn load(&mut self, url: &str) {
        self.current_url = url.to_string();
        self.current = self
            .pages
            .iter()
            .enumerate()
            .filter(|(_, page)| url.starts_with(&page.url_prefix))
            .max_by_key(|(_, page)| page.url_prefix.len())
            .map(|(idx, _)| idx);
    }

    fn navigate(&mut self, url: &str) {
        if !self.current_url.is_empty() {
            let previous = self.current_url.clone();
            self.history.push(previous);
        }
        self.load(url);
    }

    fn page(&self) -> Option<&MockPageState> {
        self.current.and_then(|idx| self.pages.get(idx))
    }

    fn resolve(&self, locator: &Locator) -> Option<MockElement> {
        let page = self.page()?;
        match locator {
            Locator::Css { selector, nth } => page.matching(selector).get(*nth).cloned(),
            Locator::Text { text, exact, nth } => page
                .all_elements()
                .filter(|el| {
                    let own = el.text.trim();
                    if *exact { own == text.trim() } else { own.contains(text.trim()) }
                })
                .nth(*nth)
                .cloned(),
            Locator::AncestorAnchor { inner } => {
                let el = self.resolve(inner)?;
                if el.tag == "A" {
                    Some(el)
                } else {
                    el.anchor.map(|anchor| *anchor)
                }
            }
        }
    }
}

#[derive(Default)]
pub struct MockPage {
    inner: Mutex<Inner>,
}

impl MockPage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clicked links keep the old page loaded for `delay` before navigating.
    pub fn with_navigation_delay(self, delay: Duration) -> Self {
        self.inner.lock().navigation_delay = delay;
        self
    }

    fn state(&self) -> MutexGuard<'_, Inner> {
        let mut inner = self.inner.lock();
        inner.catch_up();
        inner
    }

    pub fn add(&self, page: MockPageState) -> &Self {
        self.inner.lock().pages.push(page);
        self
    }

    pub fn add_page(&self, url_prefix: &str, elements: Vec<(&str, Vec<MockElement>)>) -> &Self {
        let state = elements
            .into_iter()
            .fold(MockPageState::new(url_prefix), |state, (sel, els)| state.with(sel, els));
        self.add(state)
    }

    /// Load `url` without recording a navigation.
    pub fn open(&self, url: &str) {
        self.inner.lock().load(url);
    }

    pub fn events(&self) -> Vec<MockEvent> {
        self.inner.lock().events.clone()
    }

    pub fn navigations(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                MockEvent::Goto(url) => Some(url),
                _ => None,
            })
            .collect()
    }

    pub fn clicks(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                MockEvent::Click(text) => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn current_url(&self) -> String {
        self.state().current_url.clone()
    }

    fn record(&self, event: MockEvent) {
        self.inner.lock().events.push(event);
    }
}

#[async_trait]
impl PageDriver for MockPage {
    async fn goto(&self, url: &str) -> BrowserResult<()> {
        let mut inner = self.state();
        inner.events.push(MockEvent::Goto(url.to_string()));
        inner.navigate(url);
        Ok(())
    }

    async fn url(&self) -> BrowserResult<String> {
        let url = self.state().current_url.clone();
        Ok(if url.is_empty() { "about:blank".to_string() } else { url })
    }

    async fn count(&self, selector: &str) -> BrowserResult<usize> {
        Ok(self
            .state()
            .page()
            .map(|page| page.matching(selector).len())
            .unwrap_or(0))
    }

    async fn inner_text(&self, locator: &Locator) -> BrowserResult<Option<String>> {
        Ok(self.state().resolve(locator).map(|el| el.text))
    }

    async fn tag_name(&self, locator: &Locator) -> BrowserResult<Option<String>> {
        Ok(self.state().resolve(locator).map(|el| el.tag))
    }

    async fn attribute(&self, locator: &Locator, name: &str) -> BrowserResult<Option<String>> {
        Ok(self
            .state()
            .resolve(locator)
            .and_then(|el| if name == "href" { el.href } else { None }))
    }

    async fn set_attribute(&self, locator: &Locator, name: &str, value: &str) -> BrowserResult<()> {
        let mut inner = self.state();
        let el = inner
            .resolve(locator)
            .ok_or_else(|| BrowserError::ElementNotFound(locator.to_string()))?;
        inner.events.push(MockEvent::SetAttribute(
            el.text,
            name.to_string(),
            value.to_string(),
        ));
        Ok(())
    }

    async fn is_visible(&self, locator: &Locator) -> BrowserResult<bool> {
        Ok(self
            .state()
            .resolve(locator)
            .is_some_and(|el| el.visible))
    }

    async fn click(&self, locator: &Locator, timeout: Duration) -> BrowserResult<()> {
        let mut inner = self.state();
        let el = inner
            .resolve(locator)
            .filter(|el| el.visible)
            .ok_or_else(|| BrowserError::Timeout(timeout, format!("no clickable element for {}", locator)))?;
        inner.events.push(MockEvent::Click(el.text.clone()));
        if let Some(href) = el.href {
            if inner.navigation_delay.is_zero() {
                inner.navigate(&href);
            } else {
                inner.pending = Some((Instant::now() + inner.navigation_delay, href));
            }
        }
        Ok(())
    }

    async fn scroll_into_view(&self, locator: &Locator, timeout: Duration) -> BrowserResult<()> {
        let mut inner = self.state();
        inner
            .resolve(locator)
            .ok_or_else(|| BrowserError::Timeout(timeout, format!("scroll to {}", locator)))?;
        inner.events.push(MockEvent::ScrollIntoView(locator.to_string()));
        Ok(())
    }

    async fn scroll_by(&self, x: i64, y: i64) -> BrowserResult<()> {
        self.record(MockEvent::ScrollBy(x, y));
        Ok(())
    }

    async fn viewport_height(&self) -> BrowserResult<i64> {
        Ok(900)
    }

    async fn press_escape(&self) -> BrowserResult<()> {
        self.record(MockEvent::Escape);
        Ok(())
    }

    async fn body_text(&self) -> BrowserResult<String> {
        Ok(self
            .state()
            .page()
            .map(|page| page.body.clone())
            .unwrap_or_default())
    }

    async fn html(&self) -> BrowserResult<String> {
        Ok(self
            .state()
            .page()
            .map(|page| page.html.clone())
            .unwrap_or_default())
    }

    async fn go_back(&self) -> BrowserResult<()> {
        let mut inner = self.state();
        let previous = inner
            .history
            .pop()
            .ok_or_else(|| BrowserError::NavigationFailed("no previous page in history".into()))?;
        inner.events.push(MockEvent::GoBack);
        inner.load(&previous);
        Ok(())
    }

    async fn wait_until_settled(&self, _max: Duration) -> BrowserResult<bool> {
        Ok(true)
    }
}
