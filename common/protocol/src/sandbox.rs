//! Sandbox Supervisor input/output shapes (§4.5).

use std::collections::BTreeSet;

use serde::Deserialize;
use serde::Serialize;

/// Explicit resource caps and browser policy for one sandboxed agent run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SandboxConfig {
    pub timeout_ms: u64,
    pub max_memory_mb: u64,
    pub allowed_domains: Vec<String>,
    pub blocked_domains: Vec<String>,
    pub enable_networking: bool,
    pub enable_file_access: bool,
    pub work_dir: std::path::PathBuf,
    pub resource_check_interval_ms: u64,
    pub capture_output: bool,
    pub step_limit: i64,
}

/// Why a sandboxed run ended without completing normally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SandboxErrorCategory {
    Timeout,
    Oom,
    Crash,
    AgentError,
    BrowserError,
    Unknown,
}

/// A classified failure from a sandboxed run (§4.5 step 6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SandboxError {
    pub category: SandboxErrorCategory,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

/// Captured stdout/stderr from a sandboxed run, when `capture_output` is set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CapturedOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Resource and activity counters accumulated over a sandboxed run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SandboxMetrics {
    pub duration_ms: i64,
    pub peak_memory_mb: f64,
    pub steps_executed: i64,
    pub pages_visited: i64,
    pub visited_urls: Vec<String>,
    pub total_actions: i64,
    pub cpu_time_ms: i64,
}

impl SandboxMetrics {
    /// Record a page visit, keeping `visited_urls` deduplicated while
    /// counting every visit (including repeats) toward `pages_visited`.
    pub fn record_visit(&mut self, url: impl Into<String>) {
        let url = url.into();
        self.pages_visited += 1;
        if !self.visited_urls.contains(&url) {
            self.visited_urls.push(url);
        }
    }

    pub fn observe_memory_mb(&mut self, resident_mb: f64) {
        if resident_mb > self.peak_memory_mb {
            self.peak_memory_mb = resident_mb;
        }
    }
}

/// The always-returned outcome of running one agent invocation under the
/// Sandbox Supervisor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SandboxResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<SandboxError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub duration_ms: i64,
    pub memory_usage_mb: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub captured_output: Option<CapturedOutput>,
    pub metrics: SandboxMetrics,
}

impl SandboxResult {
    pub fn success(output: serde_json::Value, metrics: SandboxMetrics) -> Self {
        Self {
            success: true,
            output: Some(output),
            error: None,
            error_message: None,
            duration_ms: metrics.duration_ms,
            memory_usage_mb: metrics.peak_memory_mb,
            captured_output: None,
            metrics,
        }
    }

    pub fn failure(error: SandboxError, metrics: SandboxMetrics) -> Self {
        Self {
            success: false,
            output: None,
            error_message: Some(error.message.clone()),
            duration_ms: metrics.duration_ms,
            memory_usage_mb: metrics.peak_memory_mb,
            captured_output: None,
            error: Some(error),
            metrics,
        }
    }
}

/// Compile an allow/block domain policy into the matcher the Command
/// Executor consults on every navigate/new_tab (§4.4 URL policy).
///
/// Pattern matching rules: `*` matches all; a host may begin `*.` to match
/// any subdomain; any other pattern is matched as an anchored regex with
/// every `*` translated to `.*`.
pub fn is_url_permitted(url: &str, allowed: &[String], blocked: &[String]) -> bool {
    if blocked.iter().any(|pattern| domain_pattern_matches(pattern, url)) {
        return false;
    }
    if allowed.is_empty() {
        return true;
    }
    allowed.iter().any(|pattern| domain_pattern_matches(pattern, url))
}

fn domain_pattern_matches(pattern: &str, url: &str) -> bool {
    if pattern == "*" {
        return true;
    }
    let host = extract_host(url);
    if let Some(suffix) = pattern.strip_prefix("*.") {
        return host == suffix || host.ends_with(&format!(".{suffix}"));
    }
    let escaped = regex::escape(pattern).replace("\\*", ".*");
    let anchored = format!("^{escaped}$");
    regex::Regex::new(&anchored)
        .map(|re| re.is_match(url) || re.is_match(&host))
        .unwrap_or(false)
}

fn extract_host(url: &str) -> String {
    let without_scheme = url.split_once("://").map(|(_, rest)| rest).unwrap_or(url);
    let host_and_port = without_scheme.split('/').next().unwrap_or(without_scheme);
    host_and_port.split(':').next().unwrap_or(host_and_port).to_string()
}

/// Deduplicate a list of domain patterns while preserving first-seen order.
pub fn dedupe_patterns(patterns: Vec<String>) -> Vec<String> {
    let mut seen = BTreeSet::new();
    let mut out = Vec::with_capacity(patterns.len());
    for pattern in patterns {
        if seen.insert(pattern.clone()) {
            out.push(pattern);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_allows_everything() {
        assert!(is_url_permitted("https://anywhere.com/x", &["*".to_string()], &[]));
    }

    #[test]
    fn subdomain_wildcard_matches_host_and_subdomains() {
        let allowed = vec!["*.example.com".to_string()];
        assert!(is_url_permitted("https://example.com/a", &allowed, &[]));
        assert!(is_url_permitted("https://docs.example.com/a", &allowed, &[]));
        assert!(!is_url_permitted("https://notexample.com/a", &allowed, &[]));
    }

    #[test]
    fn block_list_takes_priority_over_allow_list() {
        let allowed = vec!["*".to_string()];
        let blocked = vec!["*.evil.com".to_string()];
        assert!(!is_url_permitted("https://sub.evil.com/a", &allowed, &blocked));
    }

    #[test]
    fn empty_allow_list_permits_anything_not_blocked() {
        assert!(is_url_permitted("https://example.com", &[], &[]));
    }

    #[test]
    fn path_tail_pattern_matches_as_anchored_regex() {
        let allowed = vec!["https://example.com/docs/*".to_string()];
        assert!(is_url_permitted("https://example.com/docs/page", &allowed, &[]));
        assert!(!is_url_permitted("https://example.com/other/page", &allowed, &[]));
    }

    #[test]
    fn metrics_record_visit_dedupes_urls_but_counts_every_visit() {
        let mut metrics = SandboxMetrics::default();
        metrics.record_visit("https://example.com");
        metrics.record_visit("https://example.com");
        metrics.record_visit("https://other.com");
        assert_eq!(metrics.pages_visited, 3);
        assert_eq!(metrics.visited_urls.len(), 2);
    }
}
