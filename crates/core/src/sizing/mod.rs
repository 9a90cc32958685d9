pub mod dataset;
pub mod engine;
pub mod width;

pub use dataset::{DatasetError, LastSizing, ReferenceDataset};
pub use engine::{DeterministicSizingEngine, LastCalculation, SizingEngine};
pub use width::determine_width;
