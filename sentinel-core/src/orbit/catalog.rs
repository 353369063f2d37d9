//! Satellite catalog: named TLE entries
//!
//! Entries are kept as raw text and only parsed at propagation time, so one
//! malformed entry never blocks the rest of a snapshot.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// A catalog entry as stored: name plus the two raw TLE lines
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub name: String,
    pub line1: String,
    pub line2: String,
}

impl CatalogEntry {
    pub fn new(
        name: impl Into<String>,
        line1: impl Into<String>,
        line2: impl Into<String>,
    ) -> Self {
        Self { name: name.into(), line1: line1.into(), line2: line2.into() }
    }

    /// Stable identifier: lower-cased name with spaces as underscores.
    /// Unnamed entries fall back to the catalog number columns of line 1.
    pub fn id(&self) -> String {
        let name = self.name.trim();
        if !name.is_empty() {
            return name.replace(' ', "_").to_lowercase();
        }
        self.line1
            .get(2..7)
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| "unknown".to_string())
    }
}

/// Built-in catalog tracked when no catalog file is configured
pub fn default_catalog() -> Vec<CatalogEntry> {
    vec![
        CatalogEntry::new(
            "ISS (ZARYA)",
            "1 25544U 98067A   23266.52564382  .00012204  00000+0  21834-3 0  9993",
            "2 25544  51.6411 330.5453 0004878 122.4546 315.0519 15.49753158413464",
        ),
        CatalogEntry::new(
            "Hubble Space Telescope",
            "1 20580U 90037B   23266.18448469  .00008522  00000+0  14755-3 0  9998",
            "2 20580  28.4693 225.9754 0002460  64.6941 295.4418 15.09250316349084",
        ),
    ]
}

/// Parse catalog text in two-line or three-line (name first) form.
///
/// Lines starting with `1 ` or `2 ` are element lines; any other non-blank
/// line is a name, with the `0 ` prefix of some exports dropped. Element
/// lines are not validated here, so a damaged entry still comes through and
/// fails on its own at propagation time. Records missing a line are skipped
/// with a warning.
pub fn parse_catalog(text: &str) -> Vec<CatalogEntry> {
    let mut entries = Vec::new();
    let mut name: Option<(usize, String)> = None;
    let mut line1: Option<(usize, &str)> = None;

    for (index, raw) in text.lines().enumerate() {
        let line = raw.trim_end();
        if line.trim().is_empty() {
            continue;
        }
        let number = index + 1;

        if line.starts_with("1 ") {
            if let Some((start, _)) = line1.take() {
                skip_record(start, "line 2 missing");
                name = None;
            }
            line1 = Some((number, line));
        } else if line.starts_with("2 ") {
            let name = name.take().map(|(_, n)| n).unwrap_or_default();
            match line1.take() {
                Some((_, first)) => entries.push(CatalogEntry::new(name, first, line)),
                None => skip_record(number, "line 1 missing"),
            }
        } else {
            if let Some((start, _)) = line1.take() {
                skip_record(start, "line 2 missing");
            }
            if let Some((start, _)) = name.take() {
                skip_record(start, "no element lines");
            }
            let label = line.strip_prefix("0 ").unwrap_or(line).trim();
            name = Some((number, label.to_string()));
        }
    }

    if let Some((start, _)) = line1 {
        skip_record(start, "line 2 missing");
    } else if let Some((start, _)) = name {
        skip_record(start, "no element lines");
    }

    entries
}

fn skip_record(line: usize, reason: &str) {
    warn!("Skipping catalog record at line {}: {}", line, reason);
}
