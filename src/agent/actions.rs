//! Action catalog offered to the reasoning provider
//!
//! Each action has a name, a natural-language purpose and a JSON schema for
//! its arguments generated from a typed argument struct.

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::browser::BrowserError;
use crate::engines;
use crate::extraction;
use crate::navigation;
use crate::report::{ReportError, ReportRequest};
use crate::session::ResearchSession;
use crate::web_search;

#[derive(Error, Debug)]
pub enum ActionError {
    #[error("browser is not connected")]
    NoSession,

    #[error("invalid arguments for {action}: {source}")]
    InvalidArguments {
        action: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Browser(#[from] BrowserError),

    #[error(transparent)]
    Report(#[from] ReportError),
}

/// What the reasoning provider sees for one action.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub parameters: Value,
}

#[async_trait]
pub trait Action: Send + Sync {
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// JSON schema of the argument object.
    fn parameters(&self) -> Value;

    async fn invoke(&self, session: &mut ResearchSession, args: Value) -> Result<String, ActionError>;

    fn spec(&self) -> ActionSpec {
        ActionSpec {
            name: self.name(),
            description: self.description(),
            parameters: self.parameters(),
        }
    }
}

/// Fixed name → action table.
pub struct ActionCatalog {
    actions: Vec<Box<dyn Action>>,
}

impl ActionCatalog {
    pub fn new(actions: Vec<Box<dyn Action>>) -> Self {
        Self { actions }
    }

    pub fn get(&self, name: &str) -> Option<&dyn Action> {
        self.actions
            .iter()
            .find(|a| a.name() == name)
            .map(|a| a.as_ref())
    }

    pub fn specs(&self) -> Vec<ActionSpec> {
        self.actions.iter().map(|a| a.spec()).collect()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.actions.iter().map(|a| a.name()).collect()
    }
}

impl Default for ActionCatalog {
    /// The six research actions.
    fn default() -> Self {
        Self::new(vec![
            Box::new(SearchAction),
            Box::new(ScrollAction),
            Box::new(ClickAction),
            Box::new(ReadAction),
            Box::new(GoBackAction),
            Box::new(GenerateReportAction),
        ])
    }
}

/// Schema for `T` without the `$schema` meta key.
pub fn parameters_schema<T: JsonSchema>() -> Value {
    let mut value = serde_json::to_value(schemars::schema_for!(T)).unwrap_or_default();
    if let Value::Object(map) = &mut value {
        map.remove("$schema");
    }
    value
}

fn parse_args<T: DeserializeOwned>(action: &'static str, args: Value) -> Result<T, ActionError> {
    // Providers send `null` for argument-less calls
    let args = if args.is_null() { Value::Object(Default::default()) } else { args };
    serde_json::from_value(args).map_err(|source| ActionError::InvalidArguments { action, source })
}

fn default_engine() -> String {
    engines::DEFAULT_ENGINE.to_string()
}

fn default_direction() -> String {
    "down".to_string()
}

/// Accept `3` as well as `"3"`.
fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected a string or an integer, got {}",
            other
        ))),
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SearchArgs {
    /// Search keywords
    pub query: String,
    /// One of: bing, google, bilibili, xiaohongshu, weibo, duckduckgo
    #[serde(default = "default_engine")]
    pub engine: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ScrollArgs {
    /// "down" or "up"
    #[serde(default = "default_direction")]
    pub direction: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ClickArgs {
    /// Result index from the last search (e.g. "3"), or the exact visible text of a link
    #[serde(deserialize_with = "string_or_number")]
    #[schemars(with = "String")]
    pub index_or_text: String,
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct NoArgs {}

pub struct SearchAction;

#[async_trait]
impl Action for SearchAction {
    fn name(&self) -> &'static str {
        "search"
    }

    fn description(&self) -> &'static str {
        "Search the web or a social platform and list the top results with their index. \
         Engines: bing, google, bilibili, xiaohongshu, weibo, duckduckgo. \
         If the engine returns nothing or blocks the query, DuckDuckGo is tried automatically."
    }

    fn parameters(&self) -> Value {
        parameters_schema::<SearchArgs>()
    }

    async fn invoke(&self, session: &mut ResearchSession, args: Value) -> Result<String, ActionError> {
        let args: SearchArgs = parse_args(self.name(), args)?;
        let page = session.page()?;
        Ok(web_search::search(page, &args.query, &args.engine)
            .await
            .to_string())
    }
}

pub struct ScrollAction;

#[async_trait]
impl Action for ScrollAction {
    fn name(&self) -> &'static str {
        "scroll"
    }

    fn description(&self) -> &'static str {
        "Scroll the current page by one screen."
    }

    fn parameters(&self) -> Value {
        parameters_schema::<ScrollArgs>()
    }

    async fn invoke(&self, session: &mut ResearchSession, args: Value) -> Result<String, ActionError> {
        let args: ScrollArgs = parse_args(self.name(), args)?;
        Ok(navigation::scroll(session.page()?, &args.direction).await?)
    }
}

pub struct ClickAction;

#[async_trait]
impl Action for ClickAction {
    fn name(&self) -> &'static str {
        "click"
    }

    fn description(&self) -> &'static str {
        "Open a link on the current page, by its index in the last search results or by its exact text. \
         The link opens in the same tab. Every link can be opened only once per run."
    }

    fn parameters(&self) -> Value {
        parameters_schema::<ClickArgs>()
    }

    async fn invoke(&self, session: &mut ResearchSession, args: Value) -> Result<String, ActionError> {
        let args: ClickArgs = parse_args(self.name(), args)?;
        let (page, visited) = session.page_and_visited()?;
        Ok(navigation::click(page, visited, &args.index_or_text)
            .await?
            .to_string())
    }
}

pub struct ReadAction;

#[async_trait]
impl Action for ReadAction {
    fn name(&self) -> &'static str {
        "read"
    }

    fn description(&self) -> &'static str {
        "Read the current page. Collapsed posts and comment threads are expanded first. \
         The text starts with the page's source URL."
    }

    fn parameters(&self) -> Value {
        parameters_schema::<NoArgs>()
    }

    async fn invoke(&self, session: &mut ResearchSession, args: Value) -> Result<String, ActionError> {
        let _: NoArgs = parse_args(self.name(), args)?;
        Ok(extraction::read(session.page()?, session.strategies()).await?)
    }
}

pub struct GoBackAction;

#[async_trait]
impl Action for GoBackAction {
    fn name(&self) -> &'static str {
        "go_back"
    }

    fn description(&self) -> &'static str {
        "Return to the previous page."
    }

    fn parameters(&self) -> Value {
        parameters_schema::<NoArgs>()
    }

    async fn invoke(&self, session: &mut ResearchSession, args: Value) -> Result<String, ActionError> {
        let _: NoArgs = parse_args(self.name(), args)?;
        Ok(navigation::go_back(session.page()?).await?)
    }
}

pub struct GenerateReportAction;

#[async_trait]
impl Action for GenerateReportAction {
    fn name(&self) -> &'static str {
        "generate_report"
    }

    fn description(&self) -> &'static str {
        "Write the final brand sentiment report to disk. Call this once, after enough evidence has been collected."
    }

    fn parameters(&self) -> Value {
        parameters_schema::<ReportRequest>()
    }

    async fn invoke(&self, session: &mut ResearchSession, args: Value) -> Result<String, ActionError> {
        let request: ReportRequest = parse_args(self.name(), args)?;
        let path = session.reports_mut().persist(&request).await?;
        Ok(format!("Success. Report saved to: {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn catalog_lists_the_six_actions() {
        let catalog = ActionCatalog::default();
        assert_eq!(
            catalog.names(),
            vec!["search", "scroll", "click", "read", "go_back", "generate_report"]
        );
        assert!(catalog.get("search_web").is_none());
    }

    #[test]
    fn schemas_describe_arguments() {
        let specs = ActionCatalog::default().specs();
        let search = &specs[0].parameters;
        assert_eq!(search["type"], "object");
        assert!(search["properties"]["query"].is_object());
        assert_eq!(search["required"], json!(["query"]));
        assert!(search.get("$schema").is_none());

        let report = &specs[5].parameters;
        for field in [
            "brand_name",
            "sentiment_score",
            "summary",
            "risks",
            "opportunities",
            "real_quotes",
            "deep_analysis",
            "sources",
        ] {
            assert!(report["properties"][field].is_object(), "{field}");
        }
    }

    #[test]
    fn click_accepts_numeric_index() {
        let args: ClickArgs = parse_args("click", json!({"index_or_text": 3})).unwrap();
        assert_eq!(args.index_or_text, "3");
        let args: ClickArgs = parse_args("click", json!({"index_or_text": "Honest review"})).unwrap();
        assert_eq!(args.index_or_text, "Honest review");
    }

    #[test]
    fn defaults_fill_missing_arguments() {
        let search: SearchArgs = parse_args("search", json!({"query": "luckin"})).unwrap();
        assert_eq!(search.engine, "bing");
        let scroll: ScrollArgs = parse_args("scroll", Value::Null).unwrap();
        assert_eq!(scroll.direction, "down");
    }

    #[tokio::test]
    async fn page_actions_need_a_session() {
        let mut session = ResearchSession::detached(std::env::temp_dir());
        let err = ReadAction.invoke(&mut session, json!({})).await.unwrap_err();
        assert!(matches!(err, ActionError::NoSession));
        assert_eq!(err.to_string(), "browser is not connected");
    }

    #[tokio::test]
    async fn report_action_persists_without_a_page() {
        let tmp = tempfile::tempdir().unwrap();
        let mut session = ResearchSession::detached(tmp.path());
        let out = GenerateReportAction
            .invoke(
                &mut session,
                json!({
                    "brand_name": "Luckin",
                    "sentiment_score": 66,
                    "summary": "s",
                    "risks": "r",
                    "opportunities": "o",
                    "real_quotes": "q",
                    "deep_analysis": "d",
                    "sources": "https://weibo.com/1"
                }),
            )
            .await
            .unwrap();
        assert!(out.starts_with("Success. Report saved to: "));
        assert!(out.contains("Report_Luckin_"));
    }
}
