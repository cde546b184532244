//! Benchmark results and metrics files.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Local;
use serde::Serialize;

/// Outcome of classifying one dataset item.
#[derive(Debug, Clone, Serialize)]
pub struct CaseResult {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub cache_hit: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
    pub user_facing_ms: f64,
    pub background_ms: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Aggregate metrics for one run.
#[derive(Debug, Clone, Serialize)]
pub struct RunMetrics {
    pub mode: String,
    pub timestamp: String,
    pub total: usize,
    pub errors: usize,
    pub cache_hits: usize,
    pub hit_rate: f64,
    pub unique_labels: usize,
    pub clusters: usize,
    pub total_duration_ms: f64,
    pub user_facing_p50_ms: f64,
    pub user_facing_p95_ms: f64,
    pub background_p50_ms: f64,
    pub background_p95_ms: f64,
}

impl RunMetrics {
    pub fn from_cases(
        mode: &str,
        cases: &[CaseResult],
        unique_labels: usize,
        clusters: usize,
        total_duration: Duration,
    ) -> Self {
        let ok: Vec<&CaseResult> = cases.iter().filter(|c| c.error.is_none()).collect();
        let cache_hits = ok.iter().filter(|c| c.cache_hit).count();
        let user: Vec<f64> = ok.iter().map(|c| c.user_facing_ms).collect();
        let background: Vec<f64> = ok.iter().map(|c| c.background_ms).collect();
        Self {
            mode: mode.to_string(),
            timestamp: Local::now().to_rfc3339(),
            total: cases.len(),
            errors: cases.len() - ok.len(),
            cache_hits,
            hit_rate: if ok.is_empty() {
                0.0
            } else {
                cache_hits as f64 / ok.len() as f64
            },
            unique_labels,
            clusters,
            total_duration_ms: millis(total_duration),
            user_facing_p50_ms: percentile(&user, 50.0),
            user_facing_p95_ms: percentile(&user, 95.0),
            background_p50_ms: percentile(&background, 50.0),
            background_p95_ms: percentile(&background, 95.0),
        }
    }
}

pub fn millis(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

/// Nearest-rank percentile; 0 for no samples.
pub fn percentile(samples: &[f64], p: f64) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let mut sorted = samples.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let rank = ((p / 100.0) * sorted.len() as f64).ceil() as usize;
    sorted[rank.clamp(1, sorted.len()) - 1]
}

/// Writes `results_<stamp>.json` and `metrics_<stamp>.json` into `dir` and
/// returns their paths.
pub fn write(dir: &Path, cases: &[CaseResult], metrics: &RunMetrics) -> Result<(PathBuf, PathBuf)> {
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create output dir {}", dir.display()))?;
    let stamp = file_stamp();
    let results = dir.join(format!("results_{stamp}.json"));
    let metrics_path = dir.join(format!("metrics_{stamp}.json"));

    fs::write(&results, serde_json::to_vec_pretty(cases)?)
        .with_context(|| format!("failed to write {}", results.display()))?;
    fs::write(&metrics_path, serde_json::to_vec_pretty(metrics)?)
        .with_context(|| format!("failed to write {}", metrics_path.display()))?;
    Ok((results, metrics_path))
}

fn file_stamp() -> String {
    let random = uuid::Uuid::new_v4().simple().to_string();
    format!("{}_{}", Local::now().format("%Y%m%d_%H%M%S"), &random[..8])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn case(hit: bool, user_ms: f64, error: Option<&str>) -> CaseResult {
        CaseResult {
            text: "t".into(),
            expected: None,
            label: error.is_none().then(|| "greeting".to_string()),
            cache_hit: hit,
            confidence: hit.then_some(0.9),
            user_facing_ms: user_ms,
            background_ms: 0.0,
            error: error.map(str::to_string),
        }
    }

    #[test]
    fn percentiles_use_nearest_rank() {
        let samples: Vec<f64> = (1..=100).map(f64::from).collect();
        assert_eq!(percentile(&samples, 50.0), 50.0);
        assert_eq!(percentile(&samples, 95.0), 95.0);
        assert_eq!(percentile(&[7.0], 95.0), 7.0);
        assert_eq!(percentile(&[], 50.0), 0.0);
    }

    #[test]
    fn metrics_ignore_failed_cases() {
        let cases = vec![
            case(true, 10.0, None),
            case(false, 30.0, None),
            case(false, 0.0, Some("labeler: request failed")),
        ];
        let m = RunMetrics::from_cases("vectorize", &cases, 1, 1, Duration::from_millis(40));
        assert_eq!(m.total, 3);
        assert_eq!(m.errors, 1);
        assert_eq!(m.cache_hits, 1);
        assert_eq!(m.hit_rate, 0.5);
        assert_eq!(m.user_facing_p95_ms, 30.0);
    }

    #[test]
    fn writes_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let cases = vec![case(true, 1.0, None)];
        let m = RunMetrics::from_cases("llm", &cases, 1, 1, Duration::ZERO);
        let (results, metrics) = write(dir.path(), &cases, &m).unwrap();
        assert!(results.file_name().unwrap().to_string_lossy().starts_with("results_"));
        let parsed: serde_json::Value =
            serde_json::from_slice(&fs::read(&metrics).unwrap()).unwrap();
        assert_eq!(parsed["mode"], "llm");
        assert_eq!(parsed["total"], 1);
    }
}
