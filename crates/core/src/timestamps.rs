use std::{collections::HashSet, fmt, sync::LazyLock};

use regex::Regex;

static MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([0-9]+):([0-9]{2})\]").expect("valid timestamp regex"));

/// A `[minutes:seconds]` marker decoded from a summary line.
///
/// Seconds are not range-checked: `[10:75]` is 10 minutes and 75 seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Timestamp {
    pub minutes: u64,
    pub seconds: u64,
}

impl Timestamp {
    pub fn new(minutes: u64, seconds: u64) -> Self {
        Self { minutes, seconds }
    }

    /// Find the first marker in `line`. Later markers on the same line are
    /// ignored; a match whose minutes overflow is skipped.
    pub fn find_in(line: &str) -> Option<Self> {
        MARKER.captures_iter(line).find_map(|caps| {
            let minutes = caps[1].parse().ok()?;
            let seconds = caps[2].parse().ok()?;
            Some(Self { minutes, seconds })
        })
    }

    pub fn total_seconds(&self) -> u64 {
        self.minutes.saturating_mul(60).saturating_add(self.seconds)
    }

    pub fn offset_seconds(&self) -> f64 {
        self.total_seconds() as f64
    }

    pub fn key(&self) -> TimestampKey {
        TimestampKey(format!("{}:{}", self.minutes, self.seconds))
    }

    /// Deterministic artifact file name for the frame at this timestamp.
    pub fn frame_file_name(&self) -> String {
        format!("frame_{}_{}.jpg", self.minutes, self.seconds)
    }
}

/// Normalized `minutes:seconds` built from the decoded integers, so `[0:05]`
/// and `[00:05]` collapse to the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimestampKey(String);

impl TimestampKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TimestampKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What to do with one summary line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedLine<'a> {
    pub text: &'a str,
    /// Set only on the first line carrying a given key.
    pub extract: Option<Timestamp>,
}

/// Split a summary into lines and decide which ones get a frame.
pub fn plan_lines(summary: &str) -> Vec<PlannedLine<'_>> {
    let mut seen: HashSet<TimestampKey> = HashSet::new();

    summary
        .lines()
        .map(|text| {
            let extract = Timestamp::find_in(text).filter(|ts| seen.insert(ts.key()));
            PlannedLine { text, extract }
        })
        .collect()
}
