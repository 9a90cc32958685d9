use async_trait::async_trait;
use thiserror::Error;

use lastfit_core::domain::calculation::{NewSizeCalculation, SizeCalculation};
use lastfit_core::errors::ApplicationError;

pub mod memory;
pub mod size_calculation;

pub use memory::InMemorySizeCalculationRepository;
pub use size_calculation::SqlSizeCalculationRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("id space exhausted")]
    IdExhausted,
}

impl From<RepositoryError> for ApplicationError {
    fn from(value: RepositoryError) -> Self {
        ApplicationError::Persistence(value.to_string())
    }
}

/// Append-only log of submitted calculations.
///
/// Ids are assigned by the store, start at 1, and strictly increase in
/// creation order. Listing returns records in ascending id order.
#[async_trait]
pub trait SizeCalculationRepository: Send + Sync {
    async fn create_size_calculation(
        &self,
        calculation: NewSizeCalculation,
    ) -> Result<SizeCalculation, RepositoryError>;

    async fn size_calculations(&self) -> Result<Vec<SizeCalculation>, RepositoryError>;
}
