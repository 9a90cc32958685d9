use std::collections::BTreeMap;

use tokio::sync::RwLock;

use lastfit_core::domain::calculation::{NewSizeCalculation, SizeCalculation, SizeCalculationId};

use super::{RepositoryError, SizeCalculationRepository};

/// Process-local store. Contents are lost on restart.
pub struct InMemorySizeCalculationRepository {
    state: RwLock<MemoryState>,
}

struct MemoryState {
    next_id: i64,
    calculations: BTreeMap<i64, SizeCalculation>,
}

impl Default for InMemorySizeCalculationRepository {
    fn default() -> Self {
        Self { state: RwLock::new(MemoryState { next_id: 1, calculations: BTreeMap::new() }) }
    }
}

#[async_trait::async_trait]
impl SizeCalculationRepository for InMemorySizeCalculationRepository {
    async fn create_size_calculation(
        &self,
        calculation: NewSizeCalculation,
    ) -> Result<SizeCalculation, RepositoryError> {
        // Id allocation and insert happen under one write guard.
        let mut state = self.state.write().await;
        let id = state.next_id;
        state.next_id = id.checked_add(1).ok_or(RepositoryError::IdExhausted)?;

        let stored = calculation.with_id(SizeCalculationId(id));
        state.calculations.insert(id, stored.clone());
        Ok(stored)
    }

    async fn size_calculations(&self) -> Result<Vec<SizeCalculation>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state.calculations.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use lastfit_core::domain::calculation::{NewSizeCalculation, SizeCalculationId};

    use crate::repositories::{InMemorySizeCalculationRepository, SizeCalculationRepository};

    fn submission(last_type: &str, recommended_size: &str) -> NewSizeCalculation {
        NewSizeCalculation {
            last_type: last_type.to_string(),
            foot_length: 263.0,
            ball_girth: 247.5,
            recommended_size: recommended_size.to_string(),
            recommended_width: "D".to_string(),
            timestamp: "2024-05-01T12:30:00.000Z".to_string(),
        }
    }

    #[tokio::test]
    async fn empty_store_lists_nothing() {
        let repo = InMemorySizeCalculationRepository::default();

        let listed = repo.size_calculations().await.expect("list");

        assert!(listed.is_empty());
    }

    #[tokio::test]
    async fn ids_start_at_one_and_increase() {
        let repo = InMemorySizeCalculationRepository::default();

        let first =
            repo.create_size_calculation(submission("alhambra", "9.5")).await.expect("create");
        let second = repo.create_size_calculation(submission("prado", "10")).await.expect("create");

        assert_eq!(first.id, SizeCalculationId(1));
        assert_eq!(second.id, SizeCalculationId(2));
        assert_eq!(second.last_type, "prado");
    }

    #[tokio::test]
    async fn listing_returns_every_record_in_id_order() {
        let repo = InMemorySizeCalculationRepository::default();
        for size in ["9", "9.5", "10"] {
            repo.create_size_calculation(submission("cadiz", size)).await.expect("create");
        }

        let listed = repo.size_calculations().await.expect("list");

        let summary = listed
            .iter()
            .map(|calculation| (calculation.id.0, calculation.recommended_size.as_str()))
            .collect::<Vec<_>>();
        assert_eq!(summary, vec![(1, "9"), (2, "9.5"), (3, "10")]);
    }

    #[tokio::test]
    async fn concurrent_creates_get_distinct_ids() {
        let repo = Arc::new(InMemorySizeCalculationRepository::default());

        let handles = (0..32)
            .map(|index| {
                let repo = Arc::clone(&repo);
                tokio::spawn(async move {
                    repo.create_size_calculation(submission("vizcaya", &index.to_string()))
                        .await
                        .expect("create")
                        .id
                })
            })
            .collect::<Vec<_>>();

        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.expect("join").0);
        }
        ids.sort_unstable();

        assert_eq!(ids, (1..=32).collect::<Vec<_>>());
        assert_eq!(repo.size_calculations().await.expect("list").len(), 32);
    }
}
