//! Page-surface snapshot used by the Stall Detector and history rendering (§3).

use serde::Deserialize;
use serde::Serialize;

/// A lightweight snapshot of the page surface at a given step.
///
/// Cheap to compute and compare by design: the Stall Detector hashes and
/// diffs these every step, so this type never carries the full DOM tree or
/// screenshot bytes, only a digest of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSignature {
    pub url: String,
    pub dom_hash: String,
    pub scroll_y: i64,
    pub element_count: Option<i64>,
    pub text_hash: Option<String>,
}

impl PageSignature {
    pub fn new(url: impl Into<String>, dom_hash: impl Into<String>, scroll_y: i64) -> Self {
        Self {
            url: url.into(),
            dom_hash: dom_hash.into(),
            scroll_y,
            element_count: None,
            text_hash: None,
        }
    }

    pub fn with_element_count(mut self, element_count: i64) -> Self {
        self.element_count = Some(element_count);
        self
    }

    pub fn with_text_hash(mut self, text_hash: impl Into<String>) -> Self {
        self.text_hash = Some(text_hash.into());
        self
    }

    /// The compact fingerprint hashed by the Stall Detector:
    /// `url | domHash | floor(scrollY/200) | e:<elementCount?> | t:<textHash?>`.
    pub fn fingerprint(&self) -> String {
        let scroll_bucket = self.scroll_y.div_euclid(200);
        let element_count = self
            .element_count
            .map(|n| n.to_string())
            .unwrap_or_default();
        let text_hash = self.text_hash.as_deref().unwrap_or("");
        format!(
            "{}|{}|{}|e:{}|t:{}",
            self.url, self.dom_hash, scroll_bucket, element_count, text_hash
        )
    }

    /// Whether two signatures represent the same stagnant page for the
    /// purposes of the stall detector's "consecutive stagnant pages" rule:
    /// same URL and an element count within `max(10, 5%)` of each other.
    pub fn is_stagnant_relative_to(&self, other: &PageSignature) -> bool {
        if self.url != other.url {
            return false;
        }
        match (self.element_count, other.element_count) {
            (Some(a), Some(b)) => {
                let tolerance = std::cmp::max(10, b / 20);
                (a - b).abs() <= tolerance
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sig(url: &str, dom_hash: &str, scroll_y: i64) -> PageSignature {
        PageSignature::new(url, dom_hash, scroll_y)
    }

    #[test]
    fn identical_signatures_share_a_fingerprint() {
        let a = sig("https://example.com", "h1", 0);
        let b = a.clone();
        assert_eq!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn differing_dom_hash_changes_the_fingerprint() {
        let a = sig("https://example.com", "h1", 0);
        let b = sig("https://example.com", "h2", 0);
        assert_ne!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn scroll_position_is_bucketed_by_200px() {
        let a = sig("https://example.com", "h1", 50);
        let b = sig("https://example.com", "h1", 150);
        assert_eq!(a.fingerprint(), b.fingerprint());

        let c = sig("https://example.com", "h1", 250);
        assert_ne!(a.fingerprint(), c.fingerprint());
    }

    #[test]
    fn stagnant_pages_require_same_url_and_close_element_count() {
        let a = sig("https://example.com", "h1", 0).with_element_count(100);
        let b = sig("https://example.com", "h2", 0).with_element_count(105);
        assert!(a.is_stagnant_relative_to(&b));

        let c = sig("https://other.com", "h1", 0).with_element_count(100);
        assert!(!a.is_stagnant_relative_to(&c));

        let d = sig("https://example.com", "h1", 0).with_element_count(200);
        assert!(!a.is_stagnant_relative_to(&d));
    }
}
