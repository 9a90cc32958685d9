use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::domain::sizing::{FitTier, Recommendation, SizeCalculationResult, SizeRow, WidthClass};
use crate::sizing::dataset::ReferenceDataset;
use crate::sizing::width::determine_width;

/// Foot length counts twice as much as girth when choosing a row.
pub const LENGTH_WEIGHT: f64 = 2.0;
/// Combined deviation, in mm, at which confidence reaches zero.
pub const CONFIDENCE_SPAN_MM: f64 = 10.0;
/// Confidence deducted from the neighbouring sizes of the best match.
pub const ADJACENT_CONFIDENCE_PENALTY: u8 = 10;

pub const MESSAGE_FOUND: &str = "Size recommendations found";
pub const MESSAGE_NO_SUITABLE_SIZE: &str = "No suitable size found for your measurements";
pub const MESSAGE_NO_RECOMMENDATIONS: &str = "No recommendations available";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LastCalculation {
    pub last_type: String,
    pub result: SizeCalculationResult,
}

pub trait SizingEngine: Send + Sync {
    fn calculate_size(
        &self,
        last_type: &str,
        foot_length_mm: f64,
        ball_girth_mm: f64,
    ) -> SizeCalculationResult;

    /// Runs [`SizingEngine::calculate_size`] for every known last.
    fn calculate_all(&self, foot_length_mm: f64, ball_girth_mm: f64) -> Vec<LastCalculation>;

    /// Guesses a width for `last_type` from girth alone.
    fn estimate_width(
        &self,
        last_type: &str,
        foot_length_mm: f64,
        ball_girth_mm: f64,
    ) -> Option<WidthClass>;
}

#[derive(Clone, Debug)]
pub struct DeterministicSizingEngine {
    dataset: Arc<ReferenceDataset>,
}

impl DeterministicSizingEngine {
    pub fn new(dataset: Arc<ReferenceDataset>) -> Self {
        Self { dataset }
    }

    pub fn dataset(&self) -> &ReferenceDataset {
        &self.dataset
    }
}

struct Candidate<'a> {
    width: WidthClass,
    rows: &'a [SizeRow],
    index: usize,
    confidence: u8,
}

impl SizingEngine for DeterministicSizingEngine {
    fn calculate_size(
        &self,
        last_type: &str,
        foot_length_mm: f64,
        ball_girth_mm: f64,
    ) -> SizeCalculationResult {
        let Some(sizing) = self.dataset.last(last_type) else {
            return SizeCalculationResult::empty(format!(
                "Sizing data not available for {last_type}"
            ));
        };

        let mut candidates = sizing
            .widths()
            .filter_map(|(width, rows)| {
                let index = closest_row(rows, foot_length_mm, ball_girth_mm)?;
                let confidence = row_confidence(&rows[index], foot_length_mm, ball_girth_mm);
                Some(Candidate { width, rows, index, confidence })
            })
            .collect::<Vec<_>>();

        // Stable sort: equal confidences keep D, EE, EEE order.
        candidates.sort_by(|left, right| right.confidence.cmp(&left.confidence));
        let Some(primary) = candidates.first() else {
            return SizeCalculationResult::empty(MESSAGE_NO_SUITABLE_SIZE);
        };

        let recommendations = adjacent_recommendations(primary);
        let message =
            if recommendations.is_empty() { MESSAGE_NO_RECOMMENDATIONS } else { MESSAGE_FOUND };

        SizeCalculationResult {
            recommendations,
            confidence: primary.confidence,
            message: message.to_string(),
        }
    }

    fn calculate_all(&self, foot_length_mm: f64, ball_girth_mm: f64) -> Vec<LastCalculation> {
        self.dataset
            .last_types()
            .map(|last_type| LastCalculation {
                last_type: last_type.to_string(),
                result: self.calculate_size(last_type, foot_length_mm, ball_girth_mm),
            })
            .collect()
    }

    fn estimate_width(
        &self,
        last_type: &str,
        foot_length_mm: f64,
        ball_girth_mm: f64,
    ) -> Option<WidthClass> {
        let sizing = self.dataset.last(last_type)?;
        let representative = |width| {
            sizing
                .width(width)
                .and_then(|rows| nearest_by_length(rows, foot_length_mm))
                .map(|row| row.ball_girth_mm)
        };

        let d_girth = representative(WidthClass::D)?;
        Some(determine_width(
            ball_girth_mm,
            d_girth,
            representative(WidthClass::Ee),
            representative(WidthClass::Eee),
        ))
    }
}

/// Index of the row with the lowest weighted distance; the first row wins ties.
pub fn closest_row(rows: &[SizeRow], foot_length_mm: f64, ball_girth_mm: f64) -> Option<usize> {
    let mut best = None;
    let mut best_score = f64::INFINITY;

    for (index, row) in rows.iter().enumerate() {
        let score = LENGTH_WEIGHT * (row.foot_length_mm - foot_length_mm).abs()
            + (row.ball_girth_mm - ball_girth_mm).abs();
        if score < best_score {
            best_score = score;
            best = Some(index);
        }
    }

    best
}

/// Confidence in `0..=100` from the unweighted length and girth deviations.
pub fn row_confidence(row: &SizeRow, foot_length_mm: f64, ball_girth_mm: f64) -> u8 {
    let total_diff =
        (row.foot_length_mm - foot_length_mm).abs() + (row.ball_girth_mm - ball_girth_mm).abs();
    let confidence = (100.0 - (total_diff / CONFIDENCE_SPAN_MM) * 100.0).max(0.0);
    confidence.round().min(100.0) as u8
}

fn nearest_by_length(rows: &[SizeRow], foot_length_mm: f64) -> Option<&SizeRow> {
    rows.iter().fold(None, |best: Option<&SizeRow>, row| match best {
        Some(current)
            if (current.foot_length_mm - foot_length_mm).abs()
                <= (row.foot_length_mm - foot_length_mm).abs() =>
        {
            Some(current)
        }
        _ => Some(row),
    })
}

fn adjacent_recommendations(primary: &Candidate<'_>) -> Vec<Recommendation> {
    let neighbour_confidence = primary.confidence.saturating_sub(ADJACENT_CONFIDENCE_PENALTY);
    let recommendation = |index: usize, fit, confidence| Recommendation {
        size: primary.rows[index].clone(),
        width: primary.width,
        fit,
        confidence,
    };

    let mut recommendations = Vec::with_capacity(3);
    if primary.index > 0 {
        recommendations.push(recommendation(
            primary.index - 1,
            FitTier::Snugger,
            neighbour_confidence,
        ));
    }
    recommendations.push(recommendation(primary.index, FitTier::Best, primary.confidence));
    if primary.index + 1 < primary.rows.len() {
        recommendations.push(recommendation(
            primary.index + 1,
            FitTier::Roomier,
            neighbour_confidence,
        ));
    }
    recommendations
}
