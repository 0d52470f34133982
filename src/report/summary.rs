//! Summary report written at the end of a run

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

use super::error::ReportError;
use super::frequency::FrequencyTable;

/// One row of the summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryRow {
    pub text: String,
    pub count: usize,
}

/// Serialized form of the summary report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryReport {
    pub keyword: String,
    pub generated_at: DateTime<Utc>,
    pub total_entries: usize,
    pub distinct_entries: usize,
    pub top: Vec<SummaryRow>,
}

impl SummaryReport {
    pub fn new(keyword: &str, table: &FrequencyTable) -> Self {
        Self {
            keyword: keyword.to_string(),
            generated_at: Utc::now(),
            total_entries: table.total(),
            distinct_entries: table.distinct(),
            top: table
                .rows()
                .iter()
                .map(|(text, count)| SummaryRow {
                    text: text.clone(),
                    count: *count,
                })
                .collect(),
        }
    }
}

/// Keyword reduced to characters that are safe in a file name
pub fn file_stem(keyword: &str) -> String {
    let stem = keyword
        .trim()
        .chars()
        .map(|c| {
            if c.is_whitespace() || c.is_control() || "\\/:*?\"<>|".contains(c) {
                '_'
            } else {
                c
            }
        })
        .collect::<String>();
    if stem.is_empty() {
        "untitled".to_string()
    } else {
        stem
    }
}

/// Location of the summary report for `keyword`
pub fn summary_path(output_dir: &Path, keyword: &str) -> PathBuf {
    output_dir.join(format!("{}_danmaku_summary.json", file_stem(keyword)))
}

/// Location of the rendered image for `keyword`
pub fn image_path(output_dir: &Path, keyword: &str) -> PathBuf {
    output_dir.join(format!("{}_wordcloud.png", file_stem(keyword)))
}

/// Write `report` as pretty-printed JSON
pub async fn write_summary(path: &Path, report: &SummaryReport) -> Result<(), ReportError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    let json = serde_json::to_string_pretty(report)?;
    fs::write(path, json).await?;
    Ok(())
}

/// Read a summary report back
pub async fn read_summary(path: &Path) -> Result<SummaryReport, ReportError> {
    let json = fs::read_to_string(path).await?;
    Ok(serde_json::from_str(&json)?)
}
