use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::calculation::LAST_TYPE_MAX_LEN;
use crate::domain::validation::{FieldReader, ValidationErrors};

/// Upper bound for any foot length or ball girth, in millimetres.
pub const MEASUREMENT_MAX_MM: f64 = 1000.0;

/// Input to a single-last recommendation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SizeQuery {
    pub last_type: String,
    pub foot_length: f64,
    pub ball_girth: f64,
}

impl SizeQuery {
    pub fn from_payload(payload: &Value) -> Result<Self, ValidationErrors> {
        let mut reader = FieldReader::new(payload);
        let last_type = reader.string("lastType", 1, LAST_TYPE_MAX_LEN);
        let foot_length = reader.bounded_number("footLength", MEASUREMENT_MAX_MM);
        let ball_girth = reader.bounded_number("ballGirth", MEASUREMENT_MAX_MM);

        reader.finish(|| {
            Some(Self { last_type: last_type?, foot_length: foot_length?, ball_girth: ball_girth? })
        })
    }
}

/// Measurements of one or both feet, in millimetres.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FootMeasurements {
    pub left_foot_length: f64,
    pub left_ball_girth: f64,
    pub right_foot_length: Option<f64>,
    pub right_ball_girth: Option<f64>,
}

impl FootMeasurements {
    pub fn from_payload(payload: &Value) -> Result<Self, ValidationErrors> {
        let mut reader = FieldReader::new(payload);
        let left_foot_length = reader.bounded_number("leftFootLength", MEASUREMENT_MAX_MM);
        let left_ball_girth = reader.bounded_number("leftBallGirth", MEASUREMENT_MAX_MM);
        let right_foot_length = reader.optional_bounded_number("rightFootLength", MEASUREMENT_MAX_MM);
        let right_ball_girth = reader.optional_bounded_number("rightBallGirth", MEASUREMENT_MAX_MM);

        reader.finish(|| {
            Some(Self {
                left_foot_length: left_foot_length?,
                left_ball_girth: left_ball_girth?,
                right_foot_length,
                right_ball_girth,
            })
        })
    }

    /// Sizes for the larger foot: the longer length and the wider girth.
    pub fn effective(&self) -> (f64, f64) {
        let length = self
            .right_foot_length
            .map_or(self.left_foot_length, |right| self.left_foot_length.max(right));
        let girth = self
            .right_ball_girth
            .map_or(self.left_ball_girth, |right| self.left_ball_girth.max(right));
        (length, girth)
    }
}
