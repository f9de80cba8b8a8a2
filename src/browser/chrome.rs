//! `PageDriver` implementation over a chromiumoxide `Page`

use async_trait::async_trait;
use chromiumoxide::Page;
use chromiumoxide::layout::Point;
use chromiumoxide_cdp::cdp::browser_protocol::input::{DispatchKeyEventParams, DispatchKeyEventType};
use chromiumoxide_cdp::cdp::browser_protocol::page::{
    GetNavigationHistoryParams, NavigateToHistoryEntryParams,
};
use chromiumoxide_cdp::cdp::js_protocol::runtime::{CallArgument, CallFunctionOnParams};
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::debug;

use super::{BrowserError, BrowserResult, Locator, PageDriver};
use crate::utils::poll_with_backoff;

/// Resolves a serialized [`Locator`] inside the page and applies one operation
/// to the element. Always returns `{found, value}`.
const LOCATOR_FN: &str = r#"function (spec, op, name, value) {
    const byText = (text, exact) => {
        const wanted = text.trim();
        const root = document.body;
        if (!root) return [];
        const hits = [];
        for (const el of root.querySelectorAll('*')) {
            if (el.tagName === 'SCRIPT' || el.tagName === 'STYLE') continue;
            const own = (el.innerText || '').trim();
            if (exact ? own === wanted : own.includes(wanted)) hits.push(el);
        }
        return hits.filter(el => !hits.some(other => other !== el && el.contains(other)));
    };
    const resolve = (s) => {
        switch (s.kind) {
            case 'css': return document.querySelectorAll(s.selector)[s.nth] || null;
            case 'text': return byText(s.text, s.exact)[s.nth] || null;
            case 'ancestor_anchor': {
                const inner = resolve(s.inner);
                return inner ? inner.closest('a') : null;
            }
        }
        return null;
    };
    const el = resolve(spec);
    if (!el) return { found: false, value: null };
    switch (op) {
        case 'tag': return { found: true, value: el.tagName };
        case 'text': return { found: true, value: el.innerText || '' };
        case 'attr': return { found: true, value: el.getAttribute(name) };
        case 'set_attr': el.setAttribute(name, value); return { found: true, value: null };
        case 'visible': {
            const r = el.getBoundingClientRect();
            const st = window.getComputedStyle(el);
            return { found: true, value: r.width > 0 && r.height > 0 && st.visibility !== 'hidden' && st.display !== 'none' };
        }
        case 'scroll_into_view':
            el.scrollIntoView({ block: 'center' });
            return { found: true, value: null };
        case 'point': {
            el.scrollIntoView({ block: 'center' });
            const r = el.getBoundingClientRect();
            return { found: true, value: { x: r.left + r.width / 2, y: r.top + r.height / 2, width: r.width, height: r.height } };
        }
    }
    return { found: true, value: null };
}"#;

#[derive(Debug, Deserialize)]
struct LocateReply {
    found: bool,
    #[serde(default)]
    value: Value,
}

#[derive(Debug, Deserialize)]
struct ClickPoint {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
}

/// The single active browser tab.
#[derive(Clone)]
pub struct ChromePage {
    page: Page,
}

impl ChromePage {
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    /// Underlying chromiumoxide page
    pub fn inner(&self) -> &Page {
        &self.page
    }

    async fn call_function(&self, declaration: &str, args: Vec<Value>) -> BrowserResult<Value> {
        let mut builder = CallFunctionOnParams::builder()
            .function_declaration(declaration)
            .return_by_value(true);
        for arg in args {
            builder = builder.argument(CallArgument::builder().value(arg).build());
        }
        let call = builder
            .build()
            .map_err(|e| BrowserError::Script(format!("Failed to build call params: {}", e)))?;

        let result = self
            .page
            .evaluate_function(call)
            .await
            .map_err(|e| BrowserError::Script(e.to_string()))?;

        // undefined/void results carry no value
        Ok(result.into_value::<Value>().unwrap_or(Value::Null))
    }

    /// Resolve `locator` and apply `op`; `None` when the locator matches nothing.
    async fn locate(
        &self,
        locator: &Locator,
        op: &str,
        name: Option<&str>,
        value: Option<&str>,
    ) -> BrowserResult<Option<Value>> {
        let spec = serde_json::to_value(locator)
            .map_err(|e| BrowserError::Script(format!("Failed to encode locator: {}", e)))?;
        let raw = self
            .call_function(LOCATOR_FN, vec![spec, json!(op), json!(name), json!(value)])
            .await?;
        let reply: LocateReply = serde_json::from_value(raw)
            .map_err(|e| BrowserError::Script(format!("Unexpected locator reply: {}", e)))?;

        Ok(reply.found.then_some(reply.value))
    }

    async fn evaluate_value(&self, expression: &str) -> BrowserResult<Value> {
        let result = self
            .page
            .evaluate(expression)
            .await
            .map_err(|e| BrowserError::Script(e.to_string()))?;
        Ok(result.into_value::<Value>().unwrap_or(Value::Null))
    }
}

#[async_trait]
impl PageDriver for ChromePage {
    async fn goto(&self, url: &str) -> BrowserResult<()> {
        self.page
            .goto(url)
            .await
            .map_err(|e| BrowserError::NavigationFailed(format!("{}: {}", url, e)))?;

        self.page
            .wait_for_navigation()
            .await
            .map_err(|e| BrowserError::NavigationFailed(format!("{}: {}", url, e)))?;

        Ok(())
    }

    async fn url(&self) -> BrowserResult<String> {
        Ok(self
            .page
            .url()
            .await?
            .unwrap_or_else(|| "about:blank".to_string()))
    }

    async fn count(&self, selector: &str) -> BrowserResult<usize> {
        let value = self
            .call_function(
                "(sel) => document.querySelectorAll(sel).length",
                vec![json!(selector)],
            )
            .await?;
        Ok(value.as_u64().unwrap_or(0) as usize)
    }

    async fn inner_text(&self, locator: &Locator) -> BrowserResult<Option<String>> {
        Ok(self
            .locate(locator, "text", None, None)
            .await?
            .map(|v| v.as_str().unwrap_or_default().to_string()))
    }

    async fn tag_name(&self, locator: &Locator) -> BrowserResult<Option<String>> {
        Ok(self
            .locate(locator, "tag", None, None)
            .await?
            .and_then(|v| v.as_str().map(str::to_uppercase)))
    }

    async fn attribute(&self, locator: &Locator, name: &str) -> BrowserResult<Option<String>> {
        Ok(self
            .locate(locator, "attr", Some(name), None)
            .await?
            .and_then(|v| v.as_str().map(str::to_string)))
    }

    async fn set_attribute(&self, locator: &Locator, name: &str, value: &str) -> BrowserResult<()> {
        self.locate(locator, "set_attr", Some(name), Some(value))
            .await?
            .map(|_| ())
            .ok_or_else(|| BrowserError::ElementNotFound(locator.to_string()))
    }

    async fn is_visible(&self, locator: &Locator) -> BrowserResult<bool> {
        Ok(self
            .locate(locator, "visible", None, None)
            .await?
            .and_then(|v| v.as_bool())
            .unwrap_or(false))
    }

    async fn click(&self, locator: &Locator, timeout: Duration) -> BrowserResult<()> {
        // Wait for a rendered box; zero-sized elements cannot receive a mouse click
        let point = poll_with_backoff(timeout, || async {
            match self.locate(locator, "point", None, None).await {
                Ok(Some(value)) => serde_json::from_value::<ClickPoint>(value)
                    .ok()
                    .filter(|p| p.width > 0.0 && p.height > 0.0),
                Ok(None) => None,
                Err(e) => {
                    debug!("Click probe for {} failed: {}", locator, e);
                    None
                }
            }
        })
        .await
        .ok_or_else(|| BrowserError::Timeout(timeout, format!("no clickable element for {}", locator)))?;

        tokio::time::timeout(timeout, self.page.click(Point::new(point.x, point.y)))
            .await
            .map_err(|_| BrowserError::Timeout(timeout, format!("click on {}", locator)))??;

        Ok(())
    }

    async fn scroll_into_view(&self, locator: &Locator, timeout: Duration) -> BrowserResult<()> {
        poll_with_backoff(timeout, || async {
            self.locate(locator, "scroll_into_view", None, None)
                .await
                .ok()
                .flatten()
        })
        .await
        .map(|_| ())
        .ok_or_else(|| BrowserError::Timeout(timeout, format!("scroll to {}", locator)))
    }

    async fn scroll_by(&self, x: i64, y: i64) -> BrowserResult<()> {
        // Safe: parameterized evaluation prevents injection
        self.call_function("(x, y) => window.scrollBy(x, y)", vec![json!(x), json!(y)])
            .await?;
        Ok(())
    }

    async fn viewport_height(&self) -> BrowserResult<i64> {
        Ok(self
            .evaluate_value("window.innerHeight")
            .await?
            .as_i64()
            .unwrap_or(0))
    }

    async fn press_escape(&self) -> BrowserResult<()> {
        for kind in [DispatchKeyEventType::KeyDown, DispatchKeyEventType::KeyUp] {
            let params = DispatchKeyEventParams::builder()
                .r#type(kind)
                .key("Escape")
                .code("Escape")
                .windows_virtual_key_code(27)
                .native_virtual_key_code(27)
                .build()
                .map_err(BrowserError::Cdp)?;
            self.page.execute(params).await?;
        }
        Ok(())
    }

    async fn body_text(&self) -> BrowserResult<String> {
        let value = self
            .evaluate_value("document.body ? document.body.innerText : ''")
            .await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn html(&self) -> BrowserResult<String> {
        Ok(self.page.content().await?)
    }

    async fn go_back(&self) -> BrowserResult<()> {
        let history = self
            .page
            .execute(GetNavigationHistoryParams::default())
            .await?
            .result;

        let previous = usize::try_from(history.current_index - 1)
            .ok()
            .and_then(|idx| history.entries.get(idx))
            .ok_or_else(|| BrowserError::NavigationFailed("no previous page in history".into()))?;

        self.page
            .execute(NavigateToHistoryEntryParams::new(previous.id))
            .await?;
        self.page
            .wait_for_navigation()
            .await
            .map_err(|e| BrowserError::NavigationFailed(e.to_string()))?;
        Ok(())
    }

    async fn wait_until_settled(&self, max: Duration) -> BrowserResult<bool> {
        let settled = poll_with_backoff(max, || async {
            match self.evaluate_value("document.readyState").await {
                Ok(Value::String(state)) if state == "complete" => Some(()),
                _ => None,
            }
        })
        .await;
        Ok(settled.is_some())
    }
}
