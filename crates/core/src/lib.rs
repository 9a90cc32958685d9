pub mod catalog;
pub mod config;
pub mod domain;
pub mod errors;
pub mod sizing;

pub use catalog::{all_last_descriptions, display_name, last_description, LastDescription};
pub use domain::calculation::{NewSizeCalculation, SizeCalculation, SizeCalculationId};
pub use domain::measurement::{FootMeasurements, SizeQuery};
pub use domain::sizing::{FitTier, Recommendation, SizeCalculationResult, SizeRow, WidthClass};
pub use domain::validation::{FieldError, FieldErrorCode, ValidationErrors};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use sizing::{
    DatasetError, DeterministicSizingEngine, LastCalculation, LastSizing, ReferenceDataset,
    SizingEngine,
};
