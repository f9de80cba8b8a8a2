//! The browsing context every action operates on
//!
//! One page, one visited-link ledger, one report writer; owned by the
//! orchestrator for the whole run and lent to each action in turn.

use std::path::PathBuf;

use crate::agent::ActionError;
use crate::browser::PageDriver;
use crate::extraction::StrategyRegistry;
use crate::navigation::VisitedLinks;
use crate::report::ReportWriter;

pub struct ResearchSession {
    page: Option<Box<dyn PageDriver>>,
    visited: VisitedLinks,
    strategies: StrategyRegistry,
    reports: ReportWriter,
}

impl ResearchSession {
    pub fn new(page: Box<dyn PageDriver>, report_dir: impl Into<PathBuf>) -> Self {
        Self {
            page: Some(page),
            ..Self::detached(report_dir)
        }
    }

    /// Session without a browser page; page actions fail with `NoSession`.
    pub fn detached(report_dir: impl Into<PathBuf>) -> Self {
        Self {
            page: None,
            visited: VisitedLinks::new(),
            strategies: StrategyRegistry::default(),
            reports: ReportWriter::new(report_dir),
        }
    }

    pub fn with_strategies(mut self, strategies: StrategyRegistry) -> Self {
        self.strategies = strategies;
        self
    }

    pub fn page(&self) -> Result<&dyn PageDriver, ActionError> {
        self.page.as_deref().ok_or(ActionError::NoSession)
    }

    /// The page together with the visited-link ledger, for clicking.
    pub fn page_and_visited(&mut self) -> Result<(&dyn PageDriver, &mut VisitedLinks), ActionError> {
        let page = self.page.as_deref().ok_or(ActionError::NoSession)?;
        Ok((page, &mut self.visited))
    }

    pub fn visited(&self) -> &VisitedLinks {
        &self.visited
    }

    pub fn strategies(&self) -> &StrategyRegistry {
        &self.strategies
    }

    pub fn reports_mut(&mut self) -> &mut ReportWriter {
        &mut self.reports
    }
}
