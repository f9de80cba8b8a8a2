//! Brand sentiment report rendering and persistence
//!
//! The report layout is fixed: every field goes verbatim into its slot and
//! no section is ever omitted.

use chrono::{DateTime, Local, SubsecRound, TimeDelta};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Arguments of the `generate_report` action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ReportRequest {
    /// Brand under analysis, used verbatim in the title and filename
    pub brand_name: String,
    /// Overall sentiment index, 0-100
    pub sentiment_score: i64,
    /// Strategic summary of the findings
    pub summary: String,
    /// Risk assessment
    pub risks: String,
    /// Growth opportunities
    pub opportunities: String,
    /// Verbatim user quotes, each with its source platform
    pub real_quotes: String,
    /// Long-form analysis of the underlying causes
    pub deep_analysis: String,
    /// URLs of every page consulted
    pub sources: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatingTier {
    A,
    B,
    C,
    D,
}

impl RatingTier {
    pub fn from_score(score: i64) -> Self {
        match score {
            s if s >= 80 => RatingTier::A,
            s if s >= 60 => RatingTier::B,
            s if s >= 40 => RatingTier::C,
            _ => RatingTier::D,
        }
    }

    pub fn rating(&self) -> &'static str {
        match self {
            RatingTier::A => "Positive (Tier A)",
            RatingTier::B => "Neutral (Tier B)",
            RatingTier::C => "Volatile (Tier C)",
            RatingTier::D => "Negative (Tier D)",
        }
    }

    pub fn trend(&self) -> &'static str {
        match self {
            RatingTier::A => "Bullish",
            RatingTier::B => "Stable",
            RatingTier::C => "Volatile",
            RatingTier::D => "Bearish",
        }
    }
}

/// Section headings, in document order.
pub const SECTIONS: [&str; 7] = [
    "## 1. Executive Dashboard",
    "## 2. Strategic Summary",
    "## 3. Deep Dive Analysis",
    "## 4. Risk Assessment",
    "## 5. Growth Opportunities",
    "## 6. Verbatim Feedback",
    "## 7. Data References",
];

/// Render the report document.
pub fn render(request: &ReportRequest, generated_at: &DateTime<Local>) -> String {
    let tier = RatingTier::from_score(request.sentiment_score);
    let [dashboard, summary, deep_dive, risks, opportunities, quotes, references] = SECTIONS;

    format!(
        "# [REPORT] {brand} Commercial Sentiment Analysis\n\
         \n\
         **Date:** {date}  \n\
         **Source:** Brand Research Agent  \n\
         **Classification:** INTERNAL USE ONLY  \n\
         \n\
         ---\n\
         \n\
         {dashboard}\n\
         \n\
         | Metric | Value | Rating | Trend |\n\
         | :--- | :--- | :--- | :--- |\n\
         | **Sentiment Index** | **{score}/100** | {rating} | {trend} |\n\
         | **Data Sample** | Multi-channel | Validated | - |\n\
         \n\
         ---\n\
         \n\
         {summary}\n\
         {summary_text}\n\
         \n\
         ---\n\
         \n\
         {deep_dive}\n\
         {deep_text}\n\
         \n\
         ---\n\
         \n\
         {risks}\n\
         {risks_text}\n\
         \n\
         ---\n\
         \n\
         {opportunities}\n\
         {opportunities_text}\n\
         \n\
         ---\n\
         \n\
         {quotes}\n\
         {quotes_text}\n\
         \n\
         ---\n\
         \n\
         {references}\n\
         {sources_text}\n\
         \n\
         ---\n\
         *Generated by the brand research agent. Automated analysis.*\n",
        brand = request.brand_name,
        date = generated_at.format("%Y-%m-%d %H:%M:%S"),
        score = request.sentiment_score,
        rating = tier.rating(),
        trend = tier.trend(),
        summary_text = request.summary,
        deep_text = request.deep_analysis,
        risks_text = request.risks,
        opportunities_text = request.opportunities,
        quotes_text = request.real_quotes,
        sources_text = request.sources,
    )
}

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("IO error: cannot create report directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: cannot write report {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Writes reports into one directory with strictly increasing timestamps.
#[derive(Debug)]
pub struct ReportWriter {
    dir: PathBuf,
    last_stamp: Option<DateTime<Local>>,
}

impl ReportWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            last_stamp: None,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Render and save `request`, returning the absolute path written.
    pub async fn persist(&mut self, request: &ReportRequest) -> Result<PathBuf, ReportError> {
        self.persist_at(request, Local::now()).await
    }

    async fn persist_at(
        &mut self,
        request: &ReportRequest,
        now: DateTime<Local>,
    ) -> Result<PathBuf, ReportError> {
        let stamp = self.next_stamp(now);

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| ReportError::CreateDir {
                path: self.dir.clone(),
                source,
            })?;

        let filename = format!(
            "Report_{}_{}.md",
            file_safe(&request.brand_name),
            stamp.format("%Y%m%d_%H%M%S")
        );
        let path = self.dir.join(filename);
        let path = std::path::absolute(&path).unwrap_or(path);

        tokio::fs::write(&path, render(request, &stamp))
            .await
            .map_err(|source| ReportError::Write {
                path: path.clone(),
                source,
            })?;

        info!("Report generated: {}", path.display());
        Ok(path)
    }

    /// Second-resolution timestamp, bumped past the previous one if needed.
    fn next_stamp(&mut self, now: DateTime<Local>) -> DateTime<Local> {
        let mut stamp = now.trunc_subsecs(0);
        if let Some(last) = self.last_stamp
            && stamp <= last
        {
            stamp = last + TimeDelta::seconds(1);
        }
        self.last_stamp = Some(stamp);
        stamp
    }
}

/// Replace characters no filesystem accepts in a file name.
fn file_safe(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(score: i64) -> ReportRequest {
        ReportRequest {
            brand_name: "Luckin Coffee".into(),
            sentiment_score: score,
            summary: "SUMMARY-BODY".into(),
            risks: "RISKS-BODY".into(),
            opportunities: "OPPORTUNITIES-BODY".into(),
            real_quotes: "> \"9.9 is back\" (Weibo user)".into(),
            deep_analysis: "DEEP-BODY".into(),
            sources: "https://weibo.com/1".into(),
        }
    }

    #[test]
    fn tier_boundaries() {
        let cases = [
            (100, RatingTier::A, "Bullish"),
            (80, RatingTier::A, "Bullish"),
            (79, RatingTier::B, "Stable"),
            (60, RatingTier::B, "Stable"),
            (59, RatingTier::C, "Volatile"),
            (40, RatingTier::C, "Volatile"),
            (39, RatingTier::D, "Bearish"),
            (-5, RatingTier::D, "Bearish"),
        ];
        for (score, tier, trend) in cases {
            assert_eq!(RatingTier::from_score(score), tier, "score {score}");
            assert_eq!(tier.trend(), trend);
        }
    }

    #[test]
    fn all_sections_in_fixed_order() {
        let doc = render(&request(72), &Local::now());

        let mut cursor = 0;
        for heading in SECTIONS {
            let pos = doc[cursor..]
                .find(heading)
                .unwrap_or_else(|| panic!("{heading} missing or out of order"));
            cursor += pos + heading.len();
        }
        assert!(doc.contains("| **Sentiment Index** | **72/100** | Neutral (Tier B) | Stable |"));
        assert!(doc.contains("> \"9.9 is back\" (Weibo user)"));
    }

    #[test]
    fn fields_land_in_their_own_section() {
        let doc = render(&request(50), &Local::now());
        let after = |heading: &str| doc.find(heading).unwrap();
        let at = |body: &str| doc.find(body).unwrap();

        assert!(after(SECTIONS[1]) < at("SUMMARY-BODY"));
        assert!(at("SUMMARY-BODY") < after(SECTIONS[2]));
        assert!(after(SECTIONS[2]) < at("DEEP-BODY"));
        assert!(after(SECTIONS[3]) < at("RISKS-BODY"));
        assert!(after(SECTIONS[4]) < at("OPPORTUNITIES-BODY"));
    }

    #[tokio::test]
    async fn persists_into_created_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("reports").join("nested");
        let mut writer = ReportWriter::new(&dir);

        let path = writer.persist(&request(85)).await.unwrap();

        assert!(path.is_absolute());
        assert!(path.starts_with(std::path::absolute(&dir).unwrap()));
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("Report_Luckin Coffee_"), "{name}");
        assert!(name.ends_with(".md"));
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("Positive (Tier A)"));
    }

    #[tokio::test]
    async fn timestamps_strictly_increase_within_a_run() {
        let tmp = tempfile::tempdir().unwrap();
        let mut writer = ReportWriter::new(tmp.path());
        let now = Local::now();

        let first = writer.persist_at(&request(60), now).await.unwrap();
        let second = writer.persist_at(&request(60), now).await.unwrap();
        let third = writer.persist(&request(60)).await.unwrap();

        assert_ne!(first, second);
        let names: Vec<String> = [first, second, third]
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert!(names[0] < names[1], "{names:?}");
        assert!(names[1] < names[2], "{names:?}");
    }

    #[tokio::test]
    async fn unusable_directory_is_an_io_error() {
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("not_a_dir");
        std::fs::write(&blocker, "file").unwrap();
        let mut writer = ReportWriter::new(blocker.join("reports"));

        let err = writer.persist(&request(10)).await.unwrap_err();
        assert!(matches!(err, ReportError::CreateDir { .. }));
        assert!(err.to_string().starts_with("IO error: cannot create report directory"));
    }

    #[test]
    fn filename_keeps_brand_but_not_separators() {
        assert_eq!(file_safe("瑞幸 Luckin"), "瑞幸 Luckin");
        assert_eq!(file_safe("A/B:C"), "A_B_C");
    }
}
