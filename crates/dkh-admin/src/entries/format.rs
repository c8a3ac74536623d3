//! Cell text for field values

use chrono::{DateTime, FixedOffset, Offset, Utc};
use dkh_core::Value;
use dkh_core::config::DashboardConfig;

const TIMESTAMP_FORMAT: &str = "%B %-d, %Y at %-I:%M:%S %p";

/// Time zone timestamps are shown in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayZone {
    offset: FixedOffset,
    label: String,
}

impl DisplayZone {
    /// Coordinated universal time
    pub fn utc() -> Self {
        Self {
            offset: Utc.fix(),
            label: "UTC".to_string(),
        }
    }

    /// Zone at `offset_minutes` east of UTC, shown with `label`
    pub fn new(offset_minutes: i32, label: impl Into<String>) -> dkh_core::Result<Self> {
        let offset = offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| {
                dkh_core::Error::validation(
                    "dashboard.utc_offset_minutes",
                    format!("{offset_minutes} is not a valid UTC offset"),
                )
            })?;
        Ok(Self {
            offset,
            label: label.into(),
        })
    }

    /// Zone from the dashboard configuration
    pub fn from_config(config: &DashboardConfig) -> dkh_core::Result<Self> {
        Self::new(config.utc_offset_minutes, config.zone_label.clone())
    }

    /// Abbreviation shown after the time
    pub fn label(&self) -> &str {
        &self.label
    }
}

impl Default for DisplayZone {
    fn default() -> Self {
        Self::utc()
    }
}

/// Turns field values into table cell text
#[derive(Debug, Clone, Default)]
pub struct ValueFormatter {
    zone: DisplayZone,
}

impl ValueFormatter {
    /// Create a formatter for `zone`
    pub const fn new(zone: DisplayZone) -> Self {
        Self { zone }
    }

    /// Display zone
    pub const fn zone(&self) -> &DisplayZone {
        &self.zone
    }

    /// Text for a cell; an absent field reads `null`
    pub fn format(&self, value: Option<&Value>) -> String {
        let Some(value) = value else {
            return "null".to_string();
        };

        if let Some(timestamp) = value.as_timestamp() {
            return self.format_timestamp(timestamp);
        }

        match value {
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Integer(n) => n.to_string(),
            Value::Double(d) => format_number(*d),
            Value::String(s) => s.clone(),
            Value::Array(_) | Value::Map(_) | Value::Timestamp(_) => {
                serde_json::to_string_pretty(value).unwrap_or_else(|_| "null".to_string())
            }
        }
    }

    /// Long date and time, e.g. `January 1, 1970 at 12:00:00 AM UTC`
    pub fn format_timestamp(&self, timestamp: DateTime<Utc>) -> String {
        format!(
            "{} {}",
            timestamp
                .with_timezone(&self.zone.offset)
                .format(TIMESTAMP_FORMAT),
            self.zone.label
        )
    }
}

/// Number text the way a browser prints it
#[allow(clippy::float_cmp)]
fn format_number(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value.is_sign_positive() { "Infinity" } else { "-Infinity" }.to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }

    let magnitude = value.abs();
    if (1e-6..1e21).contains(&magnitude) {
        return value.to_string();
    }

    // Exponent form: 1e+21, 1.5e-7
    let text = format!("{value:e}");
    match text.split_once('e') {
        Some((mantissa, exponent)) if !exponent.starts_with('-') => format!("{mantissa}e+{exponent}"),
        _ => text,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use dkh_core::Fields;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn epoch() -> DateTime<Utc> {
        Utc.timestamp_opt(0, 0).unwrap()
    }

    #[test]
    fn test_epoch_timestamp() {
        let formatter = ValueFormatter::default();
        assert_eq!(
            formatter.format(Some(&Value::Timestamp(epoch()))),
            "January 1, 1970 at 12:00:00 AM UTC"
        );
    }

    #[test]
    fn test_zero_seconds_map_matches_native_epoch() {
        let formatter = ValueFormatter::default();
        let mut fields = Fields::new();
        fields.insert("seconds".to_string(), Value::Integer(0));
        fields.insert("nanoseconds".to_string(), Value::Integer(0));

        assert_eq!(
            formatter.format(Some(&Value::Map(fields))),
            formatter.format(Some(&Value::Timestamp(epoch())))
        );
    }

    #[test]
    fn test_configured_zone() {
        let zone = DisplayZone::new(330, "IST").unwrap();
        let formatter = ValueFormatter::new(zone);
        let ts = Utc.with_ymd_and_hms(2025, 3, 14, 9, 30, 5).unwrap();

        assert_eq!(formatter.format_timestamp(ts), "March 14, 2025 at 3:00:05 PM IST");
    }

    #[test]
    fn test_out_of_range_offset_is_rejected() {
        assert!(DisplayZone::new(i32::MAX, "X").is_err());
        assert!(DisplayZone::new(24 * 60, "X").is_err());
    }

    #[rstest]
    #[case(None, "null")]
    #[case(Some(Value::Null), "null")]
    #[case(Some(Value::Bool(true)), "true")]
    #[case(Some(Value::Bool(false)), "false")]
    #[case(Some(Value::Integer(42)), "42")]
    #[case(Some(Value::Double(1.0)), "1")]
    #[case(Some(Value::Double(2.5)), "2.5")]
    #[case(Some(Value::Double(f64::INFINITY)), "Infinity")]
    #[case(Some(Value::Double(1e21)), "1e+21")]
    #[case(Some(Value::String("Asha".to_string())), "Asha")]
    fn test_scalars(#[case] value: Option<Value>, #[case] expected: &str) {
        assert_eq!(ValueFormatter::default().format(value.as_ref()), expected);
    }

    #[test]
    fn test_map_is_pretty_json() {
        let mut fields = Fields::new();
        fields.insert("city".to_string(), Value::from("Delhi"));
        fields.insert("pin".to_string(), Value::Integer(110_001));

        assert_eq!(
            ValueFormatter::default().format(Some(&Value::Map(fields))),
            "{\n  \"city\": \"Delhi\",\n  \"pin\": 110001\n}"
        );
    }

    #[test]
    fn test_array_is_pretty_json() {
        let value = Value::Array(vec![Value::from("a"), Value::Bool(false)]);
        assert_eq!(
            ValueFormatter::default().format(Some(&value)),
            "[\n  \"a\",\n  false\n]"
        );
    }
}
