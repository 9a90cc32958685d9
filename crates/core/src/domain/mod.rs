pub mod calculation;
pub mod measurement;
pub mod sizing;
pub mod validation;
