//! Red-flag progress counter and the in-band `[COUNTER:n/m]` chunk marker.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// A marker at the very start of a chunk, plus at most one trailing newline.
static MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[COUNTER:(\d+)/(\d+)\]\n?").unwrap());

/// Red flags found vs. red flags required for the running scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Counter {
    pub current: u32,
    pub total: u32,
}

impl Counter {
    pub fn new(current: u32, total: u32) -> Self {
        Self { current, total }
    }

    /// Progress as a percentage, `None` when there is nothing to find.
    pub fn percent(&self) -> Option<f64> {
        if self.total == 0 {
            return None;
        }
        Some(f64::from(self.current) * 100.0 / f64::from(self.total))
    }

    /// Inline width value for a progress bar, e.g. `"30%"`.
    pub fn width_style(&self) -> Option<String> {
        self.percent().map(|p| format!("{p}%"))
    }
}

impl fmt::Display for Counter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.current, self.total)
    }
}

/// A counter marker split off the front of a chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterMarker<'a> {
    pub counter: Counter,
    /// Chunk text left after the marker and its newline.
    pub rest: &'a str,
}

/// Split a leading `[COUNTER:<current>/<total>]` marker off `chunk`.
///
/// Returns `None` when the chunk does not start with a well-formed marker,
/// including when either number does not fit in a `u32`. Such chunks are
/// plain text.
pub fn split_counter_marker(chunk: &str) -> Option<CounterMarker<'_>> {
    let caps = MARKER_RE.captures(chunk)?;
    let current = caps[1].parse().ok()?;
    let total = caps[2].parse().ok()?;
    let end = caps.get(0)?.end();
    Some(CounterMarker {
        counter: Counter::new(current, total),
        rest: &chunk[end..],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_marker_and_keeps_text() {
        let marker = split_counter_marker("[COUNTER:3/10]Hello").unwrap();
        assert_eq!(marker.counter, Counter::new(3, 10));
        assert_eq!(marker.rest, "Hello");
    }

    #[test]
    fn strips_exactly_one_newline() {
        let marker = split_counter_marker("[COUNTER:1/4]\n\nNext").unwrap();
        assert_eq!(marker.rest, "\nNext");
    }

    #[test]
    fn bare_marker_leaves_nothing() {
        let marker = split_counter_marker("[COUNTER:2/5]").unwrap();
        assert_eq!(marker.counter, Counter::new(2, 5));
        assert!(marker.rest.is_empty());
    }

    #[test]
    fn malformed_marker_is_plain_text() {
        assert!(split_counter_marker("[COUNTER:abc/10]").is_none());
        assert!(split_counter_marker("[COUNTER:3-10]").is_none());
        assert!(split_counter_marker("[COUNTER:99999999999/10]").is_none());
    }

    #[test]
    fn marker_must_lead_the_chunk() {
        assert!(split_counter_marker("Hi [COUNTER:3/10]").is_none());
        assert!(split_counter_marker(" [COUNTER:3/10]").is_none());
    }

    #[test]
    fn width_style_is_a_percentage() {
        assert_eq!(Counter::new(3, 10).width_style().as_deref(), Some("30%"));
        assert_eq!(Counter::new(5, 5).width_style().as_deref(), Some("100%"));
        assert_eq!(Counter::new(0, 4).width_style().as_deref(), Some("0%"));
        assert!(Counter::new(1, 3).width_style().unwrap().starts_with("33.33"));
    }

    #[test]
    fn zero_total_has_no_percent() {
        assert_eq!(Counter::new(0, 0).percent(), None);
        assert_eq!(Counter::new(0, 0).to_string(), "0/0");
    }
}
