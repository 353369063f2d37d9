//! Two-line element set validation
//!
//! Fixed-column format, 69 columns per line, mod-10 checksum in column 69.
//! Framing is checked here; the orbital fields are decoded by the `sgp4`
//! crate when the propagation backend is compiled in. Column ranges below
//! are zero-based, end-exclusive.

#[cfg(feature = "sgp4")]
use chrono::{DateTime, Utc};

use super::catalog::CatalogEntry;

pub const TLE_LINE_LENGTH: usize = 69;

/// Why an element set was rejected
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ElementParseError {
    #[error("line {line} contains non-ASCII characters")]
    NonAscii { line: u8 },

    #[error("line {line} has {length} columns, expected {}", TLE_LINE_LENGTH)]
    LineLength { line: u8, length: usize },

    #[error("line {line} starts with '{found}', expected '{line}'")]
    LineNumber { line: u8, found: char },

    #[error("line {line} is missing the separator after the line number")]
    Separator { line: u8 },

    #[error("line {line} checksum mismatch: stated {stated}, computed {computed}")]
    Checksum { line: u8, stated: char, computed: u8 },

    #[error("catalog numbers differ between lines ({line1} vs {line2})")]
    CatalogMismatch { line1: u32, line2: u32 },

    #[error("line {line} field '{field}' is malformed: '{value}'")]
    Field { line: u8, field: &'static str, value: String },

    #[error("orbital fields rejected: {0}")]
    Elements(String),

    #[error("{field} out of range: {value}")]
    OutOfRange { field: &'static str, value: f64 },
}

/// A validated two-line element set
#[derive(Debug, Clone)]
pub struct OrbitalElementSet {
    pub name: String,
    pub catalog_number: u32,
    pub line1: String,
    pub line2: String,
    #[cfg(feature = "sgp4")]
    elements: sgp4::Elements,
}

impl OrbitalElementSet {
    /// Parse and validate an element set. `name` may be empty.
    pub fn parse(name: &str, line1: &str, line2: &str) -> Result<Self, ElementParseError> {
        let line1 = line1.trim_end();
        let line2 = line2.trim_end();
        validate_line(line1, 1)?;
        validate_line(line2, 2)?;

        let catalog_number = parse_catalog_number(&line1[2..7], 1)?;
        let catalog_line2 = parse_catalog_number(&line2[2..7], 2)?;
        if catalog_number != catalog_line2 {
            return Err(ElementParseError::CatalogMismatch {
                line1: catalog_number,
                line2: catalog_line2,
            });
        }

        let name = name.trim();
        Ok(Self {
            name: name.to_string(),
            catalog_number,
            line1: line1.to_string(),
            line2: line2.to_string(),
            #[cfg(feature = "sgp4")]
            elements: decode_elements(name, line1, line2)?,
        })
    }

    pub fn from_entry(entry: &CatalogEntry) -> Result<Self, ElementParseError> {
        Self::parse(&entry.name, &entry.line1, &entry.line2)
    }
}

#[cfg(feature = "sgp4")]
impl OrbitalElementSet {
    /// Decoded orbital fields
    pub fn elements(&self) -> &sgp4::Elements {
        &self.elements
    }

    pub fn epoch(&self) -> DateTime<Utc> {
        DateTime::from_naive_utc_and_offset(self.elements.datetime, Utc)
    }

    /// Orbital period in minutes
    pub fn period_minutes(&self) -> f64 {
        1440.0 / self.elements.mean_motion
    }
}

#[cfg(feature = "sgp4")]
fn decode_elements(
    name: &str,
    line1: &str,
    line2: &str,
) -> Result<sgp4::Elements, ElementParseError> {
    let object_name = (!name.is_empty()).then(|| name.to_string());
    let elements = sgp4::Elements::from_tle(object_name, line1.as_bytes(), line2.as_bytes())
        .map_err(|e| ElementParseError::Elements(e.to_string()))?;

    if !(0.0..=180.0).contains(&elements.inclination) {
        return Err(ElementParseError::OutOfRange {
            field: "inclination",
            value: elements.inclination,
        });
    }
    if elements.mean_motion <= 0.0 {
        return Err(ElementParseError::OutOfRange {
            field: "mean motion",
            value: elements.mean_motion,
        });
    }
    Ok(elements)
}

/// Mod-10 checksum over the first 68 columns: digits count their value,
/// minus signs count one, everything else zero.
pub fn checksum(line: &str) -> u8 {
    let sum: u32 = line
        .bytes()
        .take(TLE_LINE_LENGTH - 1)
        .map(|b| match b {
            b'0'..=b'9' => u32::from(b - b'0'),
            b'-' => 1,
            _ => 0,
        })
        .sum();
    (sum % 10) as u8
}

fn validate_line(line: &str, number: u8) -> Result<(), ElementParseError> {
    if !line.is_ascii() {
        return Err(ElementParseError::NonAscii { line: number });
    }
    if line.len() != TLE_LINE_LENGTH {
        return Err(ElementParseError::LineLength { line: number, length: line.len() });
    }

    let bytes = line.as_bytes();
    if bytes[0] != b'0' + number {
        return Err(ElementParseError::LineNumber { line: number, found: bytes[0] as char });
    }
    if bytes[1] != b' ' {
        return Err(ElementParseError::Separator { line: number });
    }

    let stated = bytes[TLE_LINE_LENGTH - 1] as char;
    let computed = checksum(line);
    if stated.to_digit(10) != Some(u32::from(computed)) {
        return Err(ElementParseError::Checksum { line: number, stated, computed });
    }
    Ok(())
}

/// Catalog number, including the Alpha-5 form (`A0001` = 100001) used once
/// numbers outgrew five digits. I and O are skipped.
fn parse_catalog_number(field: &str, line: u8) -> Result<u32, ElementParseError> {
    let malformed = || ElementParseError::Field {
        line,
        field: "catalog number",
        value: field.to_string(),
    };
    let field = field.trim();
    let mut chars = field.chars();
    let first = chars.next().ok_or_else(malformed)?;

    if first.is_ascii_digit() {
        return field.parse().map_err(|_| malformed());
    }

    let prefix = match first {
        'A'..='H' => first as u32 - 'A' as u32 + 10,
        'J'..='N' => first as u32 - 'J' as u32 + 18,
        'P'..='Z' => first as u32 - 'P' as u32 + 23,
        _ => return Err(malformed()),
    };
    let rest = chars.as_str();
    if rest.len() != 4 {
        return Err(malformed());
    }
    let rest: u32 = rest.parse().map_err(|_| malformed())?;
    Ok(prefix * 10_000 + rest)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ISS_LINE1: &str =
        "1 25544U 98067A   23266.52564382  .00012204  00000+0  21834-3 0  9993";
    const ISS_LINE2: &str =
        "2 25544  51.6411 330.5453 0004878 122.4546 315.0519 15.49753158413464";

    fn fix_checksum(line: &str) -> String {
        format!("{}{}", &line[..68], checksum(line))
    }

    #[test]
    fn test_checksum() {
        assert_eq!(checksum(ISS_LINE1), 3);
        assert_eq!(checksum(ISS_LINE2), 4);
        // Minus signs count as one
        assert_eq!(checksum("1 -----"), 6);
    }

    #[test]
    fn test_parse_framing() {
        let set = OrbitalElementSet::parse(" ISS (ZARYA) ", ISS_LINE1, ISS_LINE2).unwrap();
        assert_eq!(set.name, "ISS (ZARYA)");
        assert_eq!(set.catalog_number, 25544);
        assert_eq!(set.line1, ISS_LINE1);
        assert_eq!(set.line2, ISS_LINE2);
    }

    #[test]
    fn test_trailing_whitespace_is_ignored() {
        let line1 = format!("{}  \r", ISS_LINE1);
        let set = OrbitalElementSet::parse("", &line1, ISS_LINE2).unwrap();
        assert_eq!(set.line1, ISS_LINE1);
    }

    #[test]
    fn test_reject_bad_checksum() {
        let bad = ISS_LINE1.replace("0  9993", "0  9998");
        let err = OrbitalElementSet::parse("", &bad, ISS_LINE2).unwrap_err();
        assert_eq!(err, ElementParseError::Checksum { line: 1, stated: '8', computed: 3 });
    }

    #[test]
    fn test_reject_short_line() {
        let err = OrbitalElementSet::parse("", &ISS_LINE1[..60], ISS_LINE2).unwrap_err();
        assert_eq!(err, ElementParseError::LineLength { line: 1, length: 60 });
    }

    #[test]
    fn test_reject_swapped_lines() {
        let err = OrbitalElementSet::parse("", ISS_LINE2, ISS_LINE1).unwrap_err();
        assert_eq!(err, ElementParseError::LineNumber { line: 1, found: '2' });
    }

    #[test]
    fn test_reject_missing_separator() {
        let line1 = fix_checksum(&ISS_LINE1.replacen("1 ", "1-", 1));
        let err = OrbitalElementSet::parse("", &line1, ISS_LINE2).unwrap_err();
        assert_eq!(err, ElementParseError::Separator { line: 1 });
    }

    #[test]
    fn test_reject_non_ascii() {
        let line = ISS_LINE1.replacen('U', "Ü", 1);
        let err = OrbitalElementSet::parse("", &line, ISS_LINE2).unwrap_err();
        assert_eq!(err, ElementParseError::NonAscii { line: 1 });
    }

    #[test]
    fn test_reject_catalog_mismatch() {
        // Same digit sum keeps the checksum valid
        let line2 = ISS_LINE2.replacen("25544", "25553", 1);
        let err = OrbitalElementSet::parse("", ISS_LINE1, &line2).unwrap_err();
        assert_eq!(err, ElementParseError::CatalogMismatch { line1: 25544, line2: 25553 });
    }

    #[test]
    fn test_alpha5_catalog_number() {
        assert_eq!(parse_catalog_number("25544", 1).unwrap(), 25544);
        assert_eq!(parse_catalog_number("    5", 1).unwrap(), 5);
        assert_eq!(parse_catalog_number("A0001", 1).unwrap(), 100001);
        assert_eq!(parse_catalog_number("J2931", 1).unwrap(), 182931);
        assert_eq!(parse_catalog_number("Z9999", 1).unwrap(), 339999);
        assert!(parse_catalog_number("I0001", 1).is_err());
        assert!(parse_catalog_number("     ", 1).is_err());
    }

    #[cfg(feature = "sgp4")]
    mod fields {
        use super::*;
        use approx::assert_relative_eq;
        use chrono::{Datelike, Timelike};

        #[test]
        fn test_decoded_fields() {
            let set = OrbitalElementSet::parse("ISS (ZARYA)", ISS_LINE1, ISS_LINE2).unwrap();
            let elements = set.elements();

            assert_eq!(elements.norad_id, 25544);
            assert_eq!(elements.object_name.as_deref(), Some("ISS (ZARYA)"));
            assert_relative_eq!(elements.drag_term, 0.21834e-3, max_relative = 1e-9);
            assert_relative_eq!(elements.inclination, 51.6411);
            assert_relative_eq!(elements.right_ascension, 330.5453);
            assert_relative_eq!(elements.eccentricity, 0.0004878);
            assert_relative_eq!(elements.argument_of_perigee, 122.4546);
            assert_relative_eq!(elements.mean_anomaly, 315.0519);
            assert_relative_eq!(elements.mean_motion, 15.49753158);
            assert_eq!(elements.revolution_number, 41346);
            assert_relative_eq!(set.period_minutes(), 92.918, epsilon = 1e-3);
        }

        #[test]
        fn test_epoch() {
            let set = OrbitalElementSet::parse("", ISS_LINE1, ISS_LINE2).unwrap();
            let epoch = set.epoch();
            // Day 266 of 2023 is September 23; .52564382 d = 12:36:55.626 UTC
            assert_eq!(epoch.year(), 2023);
            assert_eq!(epoch.month(), 9);
            assert_eq!(epoch.day(), 23);
            assert_eq!(epoch.hour(), 12);
            assert_eq!(epoch.minute(), 36);
            assert_eq!(epoch.second(), 55);
        }

        #[test]
        fn test_reject_garbage_field() {
            // Letters have zero weight, so the checksum still holds
            let line2 = fix_checksum(&ISS_LINE2.replacen("51.6411", "51.6A11", 1));
            let err = OrbitalElementSet::parse("", ISS_LINE1, &line2).unwrap_err();
            assert!(matches!(err, ElementParseError::Elements(_)), "{:?}", err);
        }
    }
}
