//! Duration labels and duration classification.
//!
//! The two-phase upload path attaches a coarse duration to every record:
//! whole hours past the hour mark, otherwise minutes rounded up.

use serde::{Deserialize, Serialize};

/// Unit of a classified duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DurationUnit {
    Minute,
    Hour,
}

/// Coarse duration attached to uploaded records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DurationClassification {
    pub value: u64,
    pub unit: DurationUnit,
}

impl DurationClassification {
    pub fn minutes(value: u64) -> Self {
        Self {
            value,
            unit: DurationUnit::Minute,
        }
    }

    pub fn hours(value: u64) -> Self {
        Self {
            value,
            unit: DurationUnit::Hour,
        }
    }
}

/// Parse `HH:MM:SS` or `MM:SS` into total seconds.
///
/// Bare seconds and anything with more than three components are rejected.
pub fn parse_clock(label: &str) -> Option<f64> {
    let label = label.trim();
    if label.is_empty() {
        return None;
    }

    let parts = label
        .split(':')
        .map(|p| p.trim().parse::<f64>().ok().filter(|v| v.is_finite() && *v >= 0.0))
        .collect::<Option<Vec<f64>>>()?;

    match parts.as_slice() {
        [minutes, seconds] => Some(minutes * 60.0 + seconds),
        [hours, minutes, seconds] => Some(hours * 3600.0 + minutes * 60.0 + seconds),
        _ => None,
    }
}

/// Classify a `HH:MM:SS` / `MM:SS` duration.
///
/// At or past one hour the value is whole hours (floored); below that it is
/// minutes rounded up. Unparseable input yields zero minutes.
pub fn classify_duration(label: &str) -> DurationClassification {
    let Some(seconds) = parse_clock(label) else {
        return DurationClassification::minutes(0);
    };

    if seconds >= 3600.0 {
        DurationClassification::hours((seconds / 3600.0).floor() as u64)
    } else {
        DurationClassification::minutes((seconds / 60.0).ceil() as u64)
    }
}

/// Format seconds as `MM:SS`, or `HH:MM:SS` from one hour upward.
///
/// Fractional seconds round up, so a label never classifies shorter than
/// the duration it came from.
pub fn format_duration_label(total_secs: f64) -> String {
    let total = if total_secs.is_finite() && total_secs > 0.0 {
        total_secs.ceil() as u64
    } else {
        0
    };
    let hours = total / 3600;
    let mins = (total % 3600) / 60;
    let secs = total % 60;

    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, mins, secs)
    } else {
        format!("{:02}:{:02}", mins, secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_clock() {
        assert_eq!(parse_clock("01:30"), Some(90.0));
        assert_eq!(parse_clock("1:00:00"), Some(3600.0));
        assert_eq!(parse_clock("00:00:30.5"), Some(30.5));
        assert_eq!(parse_clock("90"), None);
        assert_eq!(parse_clock("1:2:3:4"), None);
        assert_eq!(parse_clock("ab:cd"), None);
        assert_eq!(parse_clock(""), None);
    }

    #[test]
    fn test_classify_minutes_round_up() {
        assert_eq!(classify_duration("01:30"), DurationClassification::minutes(2));
        assert_eq!(classify_duration("00:01"), DurationClassification::minutes(1));
        assert_eq!(classify_duration("00:00"), DurationClassification::minutes(0));
    }

    #[test]
    fn test_classify_just_under_an_hour_stays_in_minutes() {
        assert_eq!(classify_duration("59:59"), DurationClassification::minutes(60));
    }

    #[test]
    fn test_classify_hours_floor() {
        assert_eq!(classify_duration("1:00:00"), DurationClassification::hours(1));
        assert_eq!(classify_duration("02:59:59"), DurationClassification::hours(2));
    }

    #[test]
    fn test_classify_unparseable_is_zero_minutes() {
        assert_eq!(classify_duration("soon"), DurationClassification::minutes(0));
        assert_eq!(classify_duration("45"), DurationClassification::minutes(0));
    }

    #[test]
    fn test_format_duration_label() {
        assert_eq!(format_duration_label(0.0), "00:00");
        assert_eq!(format_duration_label(89.6), "01:30");
        assert_eq!(format_duration_label(89.2), "01:30");
        assert_eq!(format_duration_label(3661.0), "01:01:01");
        assert_eq!(format_duration_label(f64::NAN), "00:00");
    }

    #[test]
    fn test_fractional_minute_classifies_up() {
        let label = format_duration_label(60.4);
        assert_eq!(label, "01:01");
        assert_eq!(classify_duration(&label), DurationClassification::minutes(2));
        assert_eq!(
            classify_duration(&format_duration_label(60.0)),
            DurationClassification::minutes(1)
        );
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(DurationClassification::hours(1)).unwrap();
        assert_eq!(json, serde_json::json!({ "value": 1, "unit": "hour" }));
    }
}
