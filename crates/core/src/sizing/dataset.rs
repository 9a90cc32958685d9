use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::sizing::{SizeRow, WidthClass};

const BUILTIN_DATASET: &str = include_str!("../../data/sizing.json");

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("could not read sizing dataset `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse sizing dataset `{origin}`: {source}")]
    Parse { origin: String, source: serde_json::Error },
    #[error("sizing rows for `{last}` width {width} are not in strictly ascending US size order at index {index}")]
    NotAscending { last: String, width: WidthClass, index: usize },
    #[error("sizing row for `{last}` width {width} at index {index} has a non-positive or non-finite measurement")]
    InvalidMeasurement { last: String, width: WidthClass, index: usize },
}

/// Width lists for one last. Each list is ordered by ascending US size.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LastSizing {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub d: Option<Vec<SizeRow>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ee: Option<Vec<SizeRow>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eee: Option<Vec<SizeRow>>,
}

impl LastSizing {
    pub fn width(&self, width: WidthClass) -> Option<&[SizeRow]> {
        match width {
            WidthClass::D => self.d.as_deref(),
            WidthClass::Ee => self.ee.as_deref(),
            WidthClass::Eee => self.eee.as_deref(),
        }
    }

    /// Defined width lists in D, EE, EEE order.
    pub fn widths(&self) -> impl Iterator<Item = (WidthClass, &[SizeRow])> {
        WidthClass::ALL
            .into_iter()
            .filter_map(move |width| self.width(width).map(|rows| (width, rows)))
    }

    pub fn available_widths(&self) -> Vec<WidthClass> {
        self.widths().filter(|(_, rows)| !rows.is_empty()).map(|(width, _)| width).collect()
    }
}

/// The reference table: last identifier to width lists. Read-only once built.
#[derive(Clone, Debug, PartialEq)]
pub struct ReferenceDataset {
    lasts: BTreeMap<String, LastSizing>,
}

impl ReferenceDataset {
    pub fn builtin() -> Result<Self, DatasetError> {
        Self::from_json_str(BUILTIN_DATASET, "builtin")
    }

    /// Loads `path` when given, otherwise the dataset compiled into the binary.
    pub fn load(path: Option<&Path>) -> Result<Self, DatasetError> {
        match path {
            Some(path) => Self::from_path(path),
            None => Self::builtin(),
        }
    }

    pub fn from_path(path: &Path) -> Result<Self, DatasetError> {
        let raw = fs::read_to_string(path)
            .map_err(|source| DatasetError::ReadFile { path: path.to_path_buf(), source })?;
        Self::from_json_str(&raw, &path.display().to_string())
    }

    pub fn from_json_str(raw: &str, origin: &str) -> Result<Self, DatasetError> {
        let lasts = serde_json::from_str::<BTreeMap<String, LastSizing>>(raw)
            .map_err(|source| DatasetError::Parse { origin: origin.to_string(), source })?;
        Self::from_lasts(lasts)
    }

    pub fn from_lasts(lasts: BTreeMap<String, LastSizing>) -> Result<Self, DatasetError> {
        for (last, sizing) in &lasts {
            for (width, rows) in sizing.widths() {
                validate_rows(last, width, rows)?;
            }
        }
        Ok(Self { lasts })
    }

    pub fn last(&self, last_type: &str) -> Option<&LastSizing> {
        self.lasts.get(last_type)
    }

    pub fn last_types(&self) -> impl Iterator<Item = &str> {
        self.lasts.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.lasts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lasts.is_empty()
    }

    pub fn row_count(&self) -> usize {
        self.lasts
            .values()
            .flat_map(|sizing| sizing.widths().map(|(_, rows)| rows.len()))
            .sum()
    }
}

fn validate_rows(last: &str, width: WidthClass, rows: &[SizeRow]) -> Result<(), DatasetError> {
    for (index, row) in rows.iter().enumerate() {
        let measurements_valid = [row.us_size, row.foot_length_mm, row.ball_girth_mm]
            .iter()
            .all(|value| value.is_finite() && *value > 0.0);
        if !measurements_valid {
            return Err(DatasetError::InvalidMeasurement { last: last.to_string(), width, index });
        }

        if index > 0 && rows[index - 1].us_size >= row.us_size {
            return Err(DatasetError::NotAscending { last: last.to_string(), width, index });
        }
    }
    Ok(())
}
