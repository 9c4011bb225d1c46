//! The Stall Detector (§4.3): bounded history of action/signature
//! fingerprints, cycle and stagnation detection, and severity escalation.

use std::collections::VecDeque;

use helm_config::StallConfig;
use helm_protocol::PageSignature;

use crate::escalation::escalation_message;
use crate::escalation::severity_for;

/// The result of one [`StallDetector::is_stuck`] check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StallStatus {
    pub stuck: bool,
    pub severity: u8,
    pub reason: Option<String>,
}

impl StallStatus {
    fn not_stuck() -> Self {
        Self {
            stuck: false,
            severity: 0,
            reason: None,
        }
    }
}

/// Fingerprints actions and page states across steps and reports how stuck
/// the agent appears to be.
pub struct StallDetector {
    config: StallConfig,
    actions: VecDeque<String>,
    signatures: VecDeque<String>,
    pages: VecDeque<PageSignature>,
    total_repetitions: i64,
}

impl StallDetector {
    pub fn new(config: StallConfig) -> Self {
        let capacity = config.window_size.max(1);
        Self {
            config,
            actions: VecDeque::with_capacity(capacity),
            signatures: VecDeque::with_capacity(capacity),
            pages: VecDeque::with_capacity(capacity),
            total_repetitions: 0,
        }
    }

    /// Record one step's joined action fingerprint.
    pub fn record_action(&mut self, fingerprint: impl Into<String>) {
        push_bounded(&mut self.actions, fingerprint.into(), self.config.window_size);
    }

    /// Record one step's page signature.
    pub fn record_fingerprint(&mut self, signature: PageSignature) {
        push_bounded(
            &mut self.signatures,
            signature.fingerprint(),
            self.config.window_size,
        );
        push_bounded(&mut self.pages, signature, self.config.window_size);
    }

    /// Walk the recorded history from most recent and check, in order:
    /// a trailing run of identical actions, an ABAB cycle, an ABCABC cycle,
    /// a trailing run of identical page-signature fingerprints, and a run of
    /// consecutive stagnant pages. The first rule that matches wins.
    pub fn is_stuck(&mut self) -> StallStatus {
        if let Some(run) = trailing_repeat_run(&self.actions) {
            if run >= self.config.max_repeated_actions {
                return self.stuck_with(1, "repeated action");
            }
        }

        if let Some(reason) = detect_abab(&self.actions) {
            self.total_repetitions += 2;
            return self.finish_stuck(reason);
        }

        if let Some(reason) = detect_abcabc(&self.actions) {
            self.total_repetitions += 3;
            return self.finish_stuck(reason);
        }

        if let Some(run) = trailing_repeat_run(&self.signatures) {
            if run >= self.config.max_repeated_fingerprints {
                return self.stuck_with(1, "repeated page signature");
            }
        }

        if let Some(run) = trailing_stagnant_run(&self.pages) {
            if run >= self.config.max_stagnant_pages {
                return self.stuck_with(1, "stagnant page");
            }
        }

        StallStatus::not_stuck()
    }

    fn stuck_with(&mut self, increment: i64, reason: &str) -> StallStatus {
        self.total_repetitions += increment;
        self.finish_stuck(reason.to_string())
    }

    fn finish_stuck(&self, reason: String) -> StallStatus {
        StallStatus {
            stuck: true,
            severity: severity_for(self.total_repetitions),
            reason: Some(reason),
        }
    }

    /// `Warning: <reason>\n<escalation message>`, per the three-tier table
    /// keyed by cumulative total repetitions.
    pub fn loop_nudge_message(&self, reason: &str) -> String {
        format!("Warning: {reason}\n{}", escalation_message(self.total_repetitions))
    }

    pub fn total_repetitions(&self) -> i64 {
        self.total_repetitions
    }
}

fn push_bounded<T>(buffer: &mut VecDeque<T>, value: T, capacity: usize) {
    buffer.push_back(value);
    while buffer.len() > capacity.max(1) {
        buffer.pop_front();
    }
}

/// Length of the trailing run of identical elements, or `None` if the
/// buffer is empty.
fn trailing_repeat_run<T: PartialEq>(buffer: &VecDeque<T>) -> Option<usize> {
    let last = buffer.back()?;
    let run = buffer.iter().rev().take_while(|item| *item == last).count();
    Some(run)
}

/// Last 4 entries forming an `A B A B` cycle with `A != B`.
fn detect_abab(buffer: &VecDeque<String>) -> Option<String> {
    if buffer.len() < 4 {
        return None;
    }
    let n = buffer.len();
    let (a1, b1, a2, b2) = (&buffer[n - 4], &buffer[n - 3], &buffer[n - 2], &buffer[n - 1]);
    if a1 != b1 && a1 == a2 && b1 == b2 {
        Some("action cycle (ABAB)".to_string())
    } else {
        None
    }
}

/// Last 6 entries forming an `A B C A B C` cycle with at least two distinct
/// values among `A`, `B`, `C`.
fn detect_abcabc(buffer: &VecDeque<String>) -> Option<String> {
    if buffer.len() < 6 {
        return None;
    }
    let n = buffer.len();
    let window = [
        &buffer[n - 6],
        &buffer[n - 5],
        &buffer[n - 4],
        &buffer[n - 3],
        &buffer[n - 2],
        &buffer[n - 1],
    ];
    let is_cycle = window[0] == window[3] && window[1] == window[4] && window[2] == window[5];
    let not_trivial = window[0] != window[1] || window[1] != window[2];
    if is_cycle && not_trivial {
        Some("action cycle (ABCABC)".to_string())
    } else {
        None
    }
}

/// Length of the trailing run of pages stagnant relative to the most recent
/// page (same URL, element count within tolerance).
fn trailing_stagnant_run(pages: &VecDeque<PageSignature>) -> Option<usize> {
    let current = pages.back()?;
    let run = pages
        .iter()
        .rev()
        .take_while(|page| page.is_stagnant_relative_to(current))
        .count();
    Some(run)
}
