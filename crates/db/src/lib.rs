pub mod connection;
pub mod migrations;
pub mod repositories;

pub use connection::{connect_with_settings, ping, DbPool};
pub use repositories::{
    InMemorySizeCalculationRepository, RepositoryError, SizeCalculationRepository,
    SqlSizeCalculationRepository,
};
