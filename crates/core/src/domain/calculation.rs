use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::validation::{FieldReader, ValidationErrors};

pub const LAST_TYPE_MAX_LEN: usize = 50;
pub const RECOMMENDED_SIZE_MAX_LEN: usize = 10;
pub const RECOMMENDED_WIDTH_MAX_LEN: usize = 5;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SizeCalculationId(pub i64);

/// A calculation submitted for analytics, before the store assigns an id.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSizeCalculation {
    pub last_type: String,
    pub foot_length: f64,
    pub ball_girth: f64,
    pub recommended_size: String,
    pub recommended_width: String,
    pub timestamp: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SizeCalculation {
    pub id: SizeCalculationId,
    pub last_type: String,
    pub foot_length: f64,
    pub ball_girth: f64,
    pub recommended_size: String,
    pub recommended_width: String,
    pub timestamp: String,
}

impl NewSizeCalculation {
    /// Validates a raw request payload. A missing `timestamp` is stamped with `now`.
    pub fn from_payload(payload: &Value, now: DateTime<Utc>) -> Result<Self, ValidationErrors> {
        let mut reader = FieldReader::new(payload);
        let last_type = reader.string("lastType", 1, LAST_TYPE_MAX_LEN);
        let foot_length = reader.number("footLength", false);
        let ball_girth = reader.number("ballGirth", false);
        let recommended_size = reader.string("recommendedSize", 0, RECOMMENDED_SIZE_MAX_LEN);
        let recommended_width = reader.string("recommendedWidth", 0, RECOMMENDED_WIDTH_MAX_LEN);
        let timestamp = reader.optional_string("timestamp");

        reader.finish(|| {
            Some(Self {
                last_type: last_type?,
                foot_length: foot_length?,
                ball_girth: ball_girth?,
                recommended_size: recommended_size?,
                recommended_width: recommended_width?,
                timestamp: timestamp
                    .unwrap_or_else(|| now.to_rfc3339_opts(SecondsFormat::Millis, true)),
            })
        })
    }

    pub fn with_id(self, id: SizeCalculationId) -> SizeCalculation {
        SizeCalculation {
            id,
            last_type: self.last_type,
            foot_length: self.foot_length,
            ball_girth: self.ball_girth,
            recommended_size: self.recommended_size,
            recommended_width: self.recommended_width,
            timestamp: self.timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    use super::{NewSizeCalculation, SizeCalculationId};

    fn now() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).single().expect("valid timestamp")
    }

    #[test]
    fn stamps_timestamp_when_absent() {
        let payload = json!({
            "lastType": "alhambra",
            "footLength": 263.0,
            "ballGirth": 247.5,
            "recommendedSize": "9.5",
            "recommendedWidth": "D"
        });

        let calculation = NewSizeCalculation::from_payload(&payload, now()).expect("valid payload");

        assert_eq!(calculation.timestamp, "2024-05-01T12:30:00.000Z");
        assert_eq!(calculation.last_type, "alhambra");
    }

    #[test]
    fn keeps_caller_supplied_timestamp() {
        let payload = json!({
            "lastType": "prado",
            "footLength": 270,
            "ballGirth": 255,
            "recommendedSize": "11",
            "recommendedWidth": "EE",
            "timestamp": "2023-01-01T00:00:00.000Z"
        });

        let calculation = NewSizeCalculation::from_payload(&payload, now()).expect("valid payload");

        assert_eq!(calculation.timestamp, "2023-01-01T00:00:00.000Z");
        assert_eq!(calculation.foot_length, 270.0);
    }

    #[test]
    fn reports_each_field_violation() {
        let payload = json!({
            "lastType": "",
            "footLength": "263",
            "recommendedSize": "12345678901",
            "recommendedWidth": "EEEEEE",
            "timestamp": 5
        });

        let errors = NewSizeCalculation::from_payload(&payload, now()).expect_err("invalid payload");

        assert_eq!(
            errors.fields().collect::<Vec<_>>(),
            vec![
                "lastType",
                "footLength",
                "ballGirth",
                "recommendedSize",
                "recommendedWidth",
                "timestamp"
            ]
        );
    }

    #[test]
    fn last_type_limit_counts_surrogate_pairs_twice() {
        let payload = |last_type: String| {
            json!({
                "lastType": last_type,
                "footLength": 263.0,
                "ballGirth": 247.5,
                "recommendedSize": "9.5",
                "recommendedWidth": "D"
            })
        };

        let errors = NewSizeCalculation::from_payload(&payload("\u{1F45E}".repeat(30)), now())
            .expect_err("sixty UTF-16 units");
        assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["lastType"]);

        NewSizeCalculation::from_payload(&payload("\u{1F45E}".repeat(25)), now())
            .expect("fifty UTF-16 units");
    }

    #[test]
    fn stored_record_serializes_with_camel_case_keys() {
        let payload = json!({
            "lastType": "cadiz",
            "footLength": 262,
            "ballGirth": 243,
            "recommendedSize": "9",
            "recommendedWidth": "D"
        });
        let record = NewSizeCalculation::from_payload(&payload, now())
            .expect("valid payload")
            .with_id(SizeCalculationId(7));

        let encoded = serde_json::to_value(&record).expect("serialize record");

        assert_eq!(encoded["id"], 7);
        assert_eq!(encoded["recommendedWidth"], "D");
        assert_eq!(encoded["timestamp"], "2024-05-01T12:30:00.000Z");
    }
}
