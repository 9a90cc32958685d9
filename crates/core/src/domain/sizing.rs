use std::fmt;

use serde::{Deserialize, Serialize};

/// One entry of the reference table for a given last and width.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SizeRow {
    pub us_size: f64,
    pub eu_size: f64,
    pub uk_size: f64,
    pub jp_size: f64,
    pub kr_size: f64,
    pub foot_length_mm: f64,
    pub ball_girth_mm: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum WidthClass {
    #[serde(rename = "D")]
    D,
    #[serde(rename = "EE")]
    Ee,
    #[serde(rename = "EEE")]
    Eee,
}

impl WidthClass {
    /// Scan order used by the recommendation engine.
    pub const ALL: [WidthClass; 3] = [WidthClass::D, WidthClass::Ee, WidthClass::Eee];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::D => "D",
            Self::Ee => "EE",
            Self::Eee => "EEE",
        }
    }
}

impl fmt::Display for WidthClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for WidthClass {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "D" => Ok(Self::D),
            "EE" => Ok(Self::Ee),
            "EEE" => Ok(Self::Eee),
            other => Err(format!("unsupported width `{other}` (expected D|EE|EEE)")),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitTier {
    Snugger,
    Best,
    Roomier,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub size: SizeRow,
    pub width: WidthClass,
    pub fit: FitTier,
    pub confidence: u8,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SizeCalculationResult {
    pub recommendations: Vec<Recommendation>,
    pub confidence: u8,
    pub message: String,
}

impl SizeCalculationResult {
    pub fn empty(message: impl Into<String>) -> Self {
        Self { recommendations: Vec::new(), confidence: 0, message: message.into() }
    }

    pub fn best(&self) -> Option<&Recommendation> {
        self.recommendations.iter().find(|recommendation| recommendation.fit == FitTier::Best)
    }
}

/// Formats a size number the way it is shown to customers: `9` or `9.5`.
pub fn size_label(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value}")
    }
}
