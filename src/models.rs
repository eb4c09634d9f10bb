//! Report data models.
//!
//! - [`AnalysisReport`]: the `{code, message, data}` envelope returned by
//!   `analyze --json` and written by the weekly job
//! - [`AnalysisData`]: chart location plus the frequency result
//! - [`WeeklyRun`]: what one weekly run produced

use crate::analysis::FrequencyResult;
use crate::error::Error;
use serde::{Deserialize, Serialize};

/// Response envelope for one analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// `200` on success, otherwise the error's status code.
    pub code: u16,
    pub message: String,
    /// Present only on success.
    pub data: Option<AnalysisData>,
}

/// Payload of a successful analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisData {
    /// Signed URL, object key, or local path of the rendered chart.
    pub chart_url: String,
    pub analysis_results: FrequencyResult,
}

impl AnalysisReport {
    pub fn success(chart_url: String, analysis_results: FrequencyResult) -> Self {
        Self {
            code: 200,
            message: "Analysis successful".to_string(),
            data: Some(AnalysisData {
                chart_url,
                analysis_results,
            }),
        }
    }

    pub fn failure(error: &Error) -> Self {
        Self {
            code: error.code(),
            message: error.to_string(),
            data: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.code == 200
    }
}

/// Files produced by one weekly run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyRun {
    /// `YYYY-MM-DD` of the run.
    pub date: String,
    pub headlines_file: String,
    pub headline_count: usize,
    pub report: AnalysisReport,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_envelope_shape() {
        let results: FrequencyResult = [("人工智能", 3u64), ("SaaS", 0u64)].into_iter().collect();
        let report = AnalysisReport::success(
            "https://bucket.cos.ap-beijing.myqcloud.com/reports/report_1.png".to_string(),
            results,
        );
        let json: serde_json::Value = serde_json::to_value(&report).unwrap();
        assert_eq!(json["code"], 200);
        assert_eq!(json["data"]["analysis_results"]["人工智能"], 3);
        assert_eq!(json["data"]["analysis_results"]["SaaS"], 0);
        assert!(json["data"]["chart_url"].as_str().unwrap().ends_with(".png"));
        assert!(report.is_success());
    }

    #[test]
    fn test_failure_envelope_carries_error() {
        let report = AnalysisReport::failure(&Error::InputMissing("36kr_headlines.txt".to_string()));
        assert_eq!(report.code, 404);
        assert!(report.message.contains("36kr_headlines.txt"));
        assert!(report.data.is_none());
        assert!(!report.is_success());
    }

    #[test]
    fn test_report_round_trips_through_json() {
        let report = AnalysisReport::success("report.png".to_string(), FrequencyResult::default());
        let json = serde_json::to_string(&report).unwrap();
        let back: AnalysisReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back, report);
    }
}
