// SPDX-License-Identifier: MIT OR Apache-2.0

//! Schema scalar types shared by every manifest family.
//!
//! Range-constrained decimals ([`MeasureType`], [`PercentType`]) reject
//! out-of-range input at construction and normalize to a 4-digit scale.
//! Duration parsing accepts the ISO 8601 `P…` form, the `HH:MM[:SS[.fff]]`
//! form used by AICC and SCORM 1.2, and a bare numeric count of seconds.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

// ── Errors ──────────────────────────────────────────────────────────────

/// Failure to parse or range-check a scalar value.
///
/// Carries the lexical value and the violated constraint; callers that know
/// the file and field promote this into their own schema-violation error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{value:?} {constraint}")]
pub struct ScalarError {
    /// Offending lexical value.
    pub value: String,
    /// The violated constraint, e.g. `"must lie in [-1, 1]"`.
    pub constraint: String,
}

impl ScalarError {
    fn new(value: impl Into<String>, constraint: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            constraint: constraint.into(),
        }
    }
}

// ── LangString / TextType ───────────────────────────────────────────────

/// A language-tagged string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LangString {
    /// RFC 5646 language tag, when declared.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// The text itself.
    pub value: String,
}

impl LangString {
    /// A lang string without a language tag.
    pub fn untagged(value: impl Into<String>) -> Self {
        Self {
            language: None,
            value: value.into(),
        }
    }

    /// A lang string with a language tag.
    pub fn tagged(language: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            language: Some(language.into()),
            value: value.into(),
        }
    }
}

/// Ordered sequence of [`LangString`]s, preserving document order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TextType(pub Vec<LangString>);

impl TextType {
    /// An empty text.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` when no entries are present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of language entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Append an entry.
    pub fn push(&mut self, entry: LangString) {
        self.0.push(entry);
    }

    /// The first entry's value, if any.
    #[must_use]
    pub fn first_value(&self) -> Option<&str> {
        self.0.first().map(|l| l.value.as_str())
    }

    /// Iterate over the entries in document order.
    pub fn iter(&self) -> impl Iterator<Item = &LangString> {
        self.0.iter()
    }
}

impl From<Vec<LangString>> for TextType {
    fn from(entries: Vec<LangString>) -> Self {
        Self(entries)
    }
}

// ── ScormDuration ───────────────────────────────────────────────────────

/// A duration with its original lexical form retained.
///
/// Calendar components of the ISO form are approximated: a year counts as
/// 365 days and a month as 30.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ScormDuration {
    raw: String,
    duration: Duration,
}

impl ScormDuration {
    /// The lexical form as it appeared in the manifest.
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The parsed duration.
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Total seconds, fractional part included.
    #[must_use]
    pub fn as_secs_f64(&self) -> f64 {
        self.duration.as_secs_f64()
    }

    fn secs_to_duration(raw: &str, seconds: f64) -> Result<Duration, ScalarError> {
        if !seconds.is_finite() || !(0.0..=86_400.0 * 36_525.0).contains(&seconds) {
            return Err(ScalarError::new(raw, "is outside the representable range"));
        }
        Ok(Duration::from_secs_f64(seconds))
    }

    fn from_iso(raw: &str) -> Result<Duration, ScalarError> {
        let upper = raw.to_ascii_uppercase();
        let body = upper
            .strip_prefix('P')
            .ok_or_else(|| ScalarError::new(raw, "must start with 'P'"))?;
        let (date_part, time_part) = match body.split_once('T') {
            Some((d, t)) => (d, t),
            None => (body, ""),
        };
        if date_part.is_empty() && time_part.is_empty() {
            return Err(ScalarError::new(raw, "must carry at least one component"));
        }

        let mut seconds = 0.0_f64;
        seconds += Self::sum_components(raw, date_part, &[('Y', 31_536_000.0), ('M', 2_592_000.0), ('W', 604_800.0), ('D', 86_400.0)])?;
        seconds += Self::sum_components(raw, time_part, &[('H', 3_600.0), ('M', 60.0), ('S', 1.0)])?;
        Self::secs_to_duration(raw, seconds)
    }

    fn sum_components(
        raw: &str,
        part: &str,
        designators: &[(char, f64)],
    ) -> Result<f64, ScalarError> {
        let mut total = 0.0_f64;
        let mut number = String::new();
        let mut next_designator = 0;
        for ch in part.chars() {
            if ch.is_ascii_digit() || ch == '.' || ch == ',' {
                number.push(if ch == ',' { '.' } else { ch });
                continue;
            }
            let Some(pos) = designators[next_designator..]
                .iter()
                .position(|&(d, _)| d == ch)
            else {
                return Err(ScalarError::new(raw, "has designators out of order"));
            };
            let value: f64 = number
                .parse()
                .map_err(|_| ScalarError::new(raw, "has a non-numeric component"))?;
            total += value * designators[next_designator + pos].1;
            number.clear();
            next_designator += pos + 1;
        }
        if !number.is_empty() {
            return Err(ScalarError::new(raw, "has a trailing number"));
        }
        Ok(total)
    }

    fn from_clock(raw: &str) -> Result<Duration, ScalarError> {
        let normalized = raw.replace(',', ".");
        let fields: Vec<&str> = normalized.split(':').collect();
        if fields.len() < 2 || fields.len() > 3 {
            return Err(ScalarError::new(raw, "must be HH:MM or HH:MM:SS"));
        }
        let hours: f64 = fields[0]
            .trim()
            .parse()
            .map_err(|_| ScalarError::new(raw, "has a non-numeric hour field"))?;
        let minutes: f64 = fields[1]
            .trim()
            .parse()
            .map_err(|_| ScalarError::new(raw, "has a non-numeric minute field"))?;
        let seconds: f64 = if fields.len() == 3 {
            fields[2]
                .trim()
                .parse()
                .map_err(|_| ScalarError::new(raw, "has a non-numeric second field"))?
        } else {
            0.0
        };
        if hours < 0.0 || minutes < 0.0 || seconds < 0.0 {
            return Err(ScalarError::new(raw, "must be non-negative"));
        }
        Self::secs_to_duration(raw, hours * 3_600.0 + minutes * 60.0 + seconds)
    }
}

impl FromStr for ScormDuration {
    type Err = ScalarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ScalarError::new(s, "must not be empty"));
        }
        let duration = if trimmed.starts_with('P') || trimmed.starts_with('p') {
            Self::from_iso(trimmed)?
        } else if trimmed.contains(':') {
            Self::from_clock(trimmed)?
        } else {
            // Bare numeric field: a count of seconds.
            let seconds: f64 = trimmed
                .parse()
                .map_err(|_| ScalarError::new(s, "is not a duration"))?;
            if seconds < 0.0 {
                return Err(ScalarError::new(s, "must be non-negative"));
            }
            Self::secs_to_duration(s, seconds)?
        };
        Ok(Self {
            raw: trimmed.to_string(),
            duration,
        })
    }
}

impl TryFrom<String> for ScormDuration {
    type Error = ScalarError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<ScormDuration> for String {
    fn from(d: ScormDuration) -> Self {
        d.raw
    }
}

impl fmt::Display for ScormDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

// ── Instant ─────────────────────────────────────────────────────────────

/// Parse an ISO 8601 timestamp. The empty string maps to the Unix epoch.
///
/// Accepts a full RFC 3339 instant, a date-time without an offset (taken as
/// UTC), or a bare date.
pub fn parse_instant(s: &str) -> Result<DateTime<Utc>, ScalarError> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Ok(DateTime::UNIX_EPOCH);
    }
    if let Ok(instant) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(instant.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(naive.and_utc());
        }
    }
    if let Ok(date) = chrono::NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(date.and_time(chrono::NaiveTime::MIN).and_utc());
    }
    Err(ScalarError::new(s, "is not an ISO 8601 instant"))
}

// ── MeasureType / PercentType ───────────────────────────────────────────

fn round_to_scale(value: f64, digits: u32) -> f64 {
    let factor = 10_f64.powi(digits as i32);
    (value * factor).round() / factor
}

/// A normalized measure in `[-1, 1]`, held at a 4-digit scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct MeasureType(f64);

impl MeasureType {
    /// Construct from a raw decimal, rejecting out-of-range input.
    pub fn new(value: f64) -> Result<Self, ScalarError> {
        if !value.is_finite() || !(-1.0..=1.0).contains(&value) {
            return Err(ScalarError::new(value.to_string(), "must lie in [-1, 1]"));
        }
        Ok(Self(round_to_scale(value, 4)))
    }

    /// The normalized value.
    #[must_use]
    pub fn value(self) -> f64 {
        self.0
    }
}

impl FromStr for MeasureType {
    type Err = ScalarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: f64 = s
            .trim()
            .parse()
            .map_err(|_| ScalarError::new(s, "is not a decimal"))?;
        Self::new(value)
    }
}

impl TryFrom<f64> for MeasureType {
    type Error = ScalarError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<MeasureType> for f64 {
    fn from(m: MeasureType) -> Self {
        m.0
    }
}

impl fmt::Display for MeasureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}", self.0)
    }
}

/// A fraction in `[0, 1]`, held at a 4-digit scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct PercentType(f64);

impl PercentType {
    /// Construct from a raw decimal, rejecting out-of-range input.
    pub fn new(value: f64) -> Result<Self, ScalarError> {
        if !value.is_finite() || !(0.0..=1.0).contains(&value) {
            return Err(ScalarError::new(value.to_string(), "must lie in [0, 1]"));
        }
        Ok(Self(round_to_scale(value, 4)))
    }

    /// The normalized value.
    #[must_use]
    pub fn value(self) -> f64 {
        self.0
    }
}

impl FromStr for PercentType {
    type Err = ScalarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: f64 = s
            .trim()
            .parse()
            .map_err(|_| ScalarError::new(s, "is not a decimal"))?;
        Self::new(value)
    }
}

impl TryFrom<f64> for PercentType {
    type Error = ScalarError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PercentType> for f64 {
    fn from(p: PercentType) -> Self {
        p.0
    }
}

impl fmt::Display for PercentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}", self.0)
    }
}

// ── YesNoType ───────────────────────────────────────────────────────────

/// The `yes`/`no` vocabulary, tolerant of future extensions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum YesNoType {
    /// The value `yes`.
    Yes,
    /// The value `no`.
    No,
    /// Unrecognized vocabulary, preserved verbatim.
    Unknown(String),
}

impl YesNoType {
    /// Case-insensitive parse; unrecognized text is preserved, not rejected.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "yes" | "true" => Self::Yes,
            "no" | "false" => Self::No,
            _ => Self::Unknown(s.trim().to_string()),
        }
    }

    /// `true` for [`YesNoType::Yes`].
    #[must_use]
    pub fn is_yes(&self) -> bool {
        matches!(self, Self::Yes)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // -- TextType --------------------------------------------------------

    #[test]
    fn text_type_first_value() {
        let mut text = TextType::new();
        assert!(text.first_value().is_none());
        text.push(LangString::tagged("en", "Golf"));
        text.push(LangString::tagged("fr", "Le Golf"));
        assert_eq!(text.first_value(), Some("Golf"));
        assert_eq!(text.len(), 2);
    }

    // -- Durations -------------------------------------------------------

    #[test]
    fn iso_duration_time_part() {
        let d: ScormDuration = "PT1H30M".parse().unwrap();
        assert_eq!(d.duration(), Duration::from_secs(5_400));
        assert_eq!(d.raw(), "PT1H30M");
    }

    #[test]
    fn iso_duration_date_and_time() {
        let d: ScormDuration = "P1DT2H".parse().unwrap();
        assert_eq!(d.duration(), Duration::from_secs(93_600));
    }

    #[test]
    fn iso_duration_fractional_seconds() {
        let d: ScormDuration = "PT0.5S".parse().unwrap();
        assert_eq!(d.duration(), Duration::from_millis(500));
    }

    #[test]
    fn iso_duration_calendar_approximation() {
        let d: ScormDuration = "P1Y".parse().unwrap();
        assert_eq!(d.duration(), Duration::from_secs(31_536_000));
        let d: ScormDuration = "P2M".parse().unwrap();
        assert_eq!(d.duration(), Duration::from_secs(5_184_000));
    }

    #[test]
    fn iso_duration_month_vs_minute() {
        // M before T is months; after T it is minutes.
        let months: ScormDuration = "P1M".parse().unwrap();
        let minutes: ScormDuration = "PT1M".parse().unwrap();
        assert_eq!(months.duration(), Duration::from_secs(2_592_000));
        assert_eq!(minutes.duration(), Duration::from_secs(60));
    }

    #[test]
    fn clock_duration_full() {
        let d: ScormDuration = "01:30:15".parse().unwrap();
        assert_eq!(d.duration(), Duration::from_secs(5_415));
    }

    #[test]
    fn clock_duration_without_seconds() {
        let d: ScormDuration = "02:45".parse().unwrap();
        assert_eq!(d.duration(), Duration::from_secs(9_900));
    }

    #[test]
    fn clock_duration_fractional_seconds() {
        let dot: ScormDuration = "00:00:01.5".parse().unwrap();
        let comma: ScormDuration = "00:00:01,5".parse().unwrap();
        assert_eq!(dot.duration(), Duration::from_millis(1_500));
        assert_eq!(comma.duration(), Duration::from_millis(1_500));
    }

    #[test]
    fn bare_number_is_seconds() {
        let d: ScormDuration = "90".parse().unwrap();
        assert_eq!(d.duration(), Duration::from_secs(90));
    }

    #[test]
    fn duration_rejects_garbage() {
        assert!("".parse::<ScormDuration>().is_err());
        assert!("banana".parse::<ScormDuration>().is_err());
        assert!("P".parse::<ScormDuration>().is_err());
        assert!("PT1H30".parse::<ScormDuration>().is_err());
        assert!("1:2:3:4".parse::<ScormDuration>().is_err());
        assert!("-30".parse::<ScormDuration>().is_err());
    }

    #[test]
    fn duration_rejects_out_of_order_designators() {
        assert!("PT30M1H".parse::<ScormDuration>().is_err());
    }

    #[test]
    fn duration_serde_uses_lexical_form() {
        let d: ScormDuration = "PT10M".parse().unwrap();
        let json = serde_json::to_string(&d).unwrap();
        assert_eq!(json, "\"PT10M\"");
        let back: ScormDuration = serde_json::from_str(&json).unwrap();
        assert_eq!(back, d);
    }

    // -- Instants --------------------------------------------------------

    #[test]
    fn instant_empty_is_epoch() {
        let instant = parse_instant("").unwrap();
        assert_eq!(instant.timestamp(), 0);
    }

    #[test]
    fn instant_rfc3339() {
        let instant = parse_instant("2004-05-07T12:00:00Z").unwrap();
        assert_eq!(instant.timestamp(), 1_083_931_200);
    }

    #[test]
    fn instant_without_offset_is_utc() {
        let instant = parse_instant("2004-05-07T12:00:00").unwrap();
        assert_eq!(instant.timestamp(), 1_083_931_200);
    }

    #[test]
    fn instant_bare_date() {
        let instant = parse_instant("2004-05-07").unwrap();
        assert_eq!(instant.timestamp(), 1_083_888_000);
    }

    #[test]
    fn instant_rejects_garbage() {
        assert!(parse_instant("next tuesday").is_err());
    }

    // -- Measures and percents ------------------------------------------

    #[test]
    fn measure_accepts_range() {
        assert_eq!(MeasureType::new(-1.0).unwrap().value(), -1.0);
        assert_eq!(MeasureType::new(1.0).unwrap().value(), 1.0);
        assert_eq!(MeasureType::new(0.0).unwrap().value(), 0.0);
    }

    #[test]
    fn measure_rejects_out_of_range() {
        assert!(MeasureType::new(1.0001).is_err());
        assert!(MeasureType::new(-1.0001).is_err());
        assert!(MeasureType::new(f64::NAN).is_err());
    }

    #[test]
    fn measure_rounds_to_four_digits() {
        let m = MeasureType::new(0.123_456).unwrap();
        assert_eq!(m.value(), 0.1235);
        assert_eq!(m.to_string(), "0.1235");
    }

    #[test]
    fn measure_parse_then_serialize_is_closed() {
        for raw in ["-1", "-0.5", "0", "0.3333", "1"] {
            let m: MeasureType = raw.parse().unwrap();
            let again: MeasureType = m.to_string().parse().unwrap();
            assert_eq!(m, again);
        }
    }

    #[test]
    fn percent_accepts_range() {
        assert_eq!(PercentType::new(0.0).unwrap().value(), 0.0);
        assert_eq!(PercentType::new(1.0).unwrap().value(), 1.0);
        assert_eq!(PercentType::new(0.8).unwrap().value(), 0.8);
    }

    #[test]
    fn percent_rejects_out_of_range() {
        assert!(PercentType::new(-0.01).is_err());
        assert!(PercentType::new(1.01).is_err());
        assert!("150%".parse::<PercentType>().is_err());
    }

    #[test]
    fn percent_parse_then_serialize_is_closed() {
        for raw in ["0", "0.25", "0.5", "0.9999", "1"] {
            let p: PercentType = raw.parse().unwrap();
            let again: PercentType = p.to_string().parse().unwrap();
            assert_eq!(p, again);
        }
    }

    #[test]
    fn measure_serde_roundtrip() {
        let m = MeasureType::new(0.75).unwrap();
        let json = serde_json::to_string(&m).unwrap();
        assert_eq!(json, "0.75");
        let back: MeasureType = serde_json::from_str(&json).unwrap();
        assert_eq!(back, m);
    }

    #[test]
    fn measure_serde_rejects_out_of_range() {
        assert!(serde_json::from_str::<MeasureType>("2.0").is_err());
    }

    // -- YesNoType -------------------------------------------------------

    #[test]
    fn yes_no_parse() {
        assert_eq!(YesNoType::parse("yes"), YesNoType::Yes);
        assert_eq!(YesNoType::parse("YES"), YesNoType::Yes);
        assert_eq!(YesNoType::parse(" No "), YesNoType::No);
        assert_eq!(YesNoType::parse("true"), YesNoType::Yes);
    }

    #[test]
    fn yes_no_preserves_unknown() {
        assert_eq!(
            YesNoType::parse("maybe"),
            YesNoType::Unknown("maybe".into())
        );
    }
}
