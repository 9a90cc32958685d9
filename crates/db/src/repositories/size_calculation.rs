use sqlx::Row;

use lastfit_core::domain::calculation::{NewSizeCalculation, SizeCalculation, SizeCalculationId};

use super::{RepositoryError, SizeCalculationRepository};
use crate::DbPool;

pub struct SqlSizeCalculationRepository {
    pool: DbPool,
}

impl SqlSizeCalculationRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_calculation(row: &sqlx::sqlite::SqliteRow) -> Result<SizeCalculation, RepositoryError> {
    let decode = |e: sqlx::Error| RepositoryError::Decode(e.to_string());

    Ok(SizeCalculation {
        id: SizeCalculationId(row.try_get("id").map_err(decode)?),
        last_type: row.try_get("last_type").map_err(decode)?,
        foot_length: row.try_get("foot_length").map_err(decode)?,
        ball_girth: row.try_get("ball_girth").map_err(decode)?,
        recommended_size: row.try_get("recommended_size").map_err(decode)?,
        recommended_width: row.try_get("recommended_width").map_err(decode)?,
        timestamp: row.try_get("timestamp").map_err(decode)?,
    })
}

#[async_trait::async_trait]
impl SizeCalculationRepository for SqlSizeCalculationRepository {
    async fn create_size_calculation(
        &self,
        calculation: NewSizeCalculation,
    ) -> Result<SizeCalculation, RepositoryError> {
        let result = sqlx::query(
            "INSERT INTO size_calculations
                (last_type, foot_length, ball_girth, recommended_size, recommended_width, timestamp)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&calculation.last_type)
        .bind(calculation.foot_length)
        .bind(calculation.ball_girth)
        .bind(&calculation.recommended_size)
        .bind(&calculation.recommended_width)
        .bind(&calculation.timestamp)
        .execute(&self.pool)
        .await?;

        Ok(calculation.with_id(SizeCalculationId(result.last_insert_rowid())))
    }

    async fn size_calculations(&self) -> Result<Vec<SizeCalculation>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, last_type, foot_length, ball_girth,
                    recommended_size, recommended_width, timestamp
             FROM size_calculations
             ORDER BY id ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_calculation).collect::<Result<Vec<_>, _>>()
    }
}

#[cfg(test)]
mod tests {
    use lastfit_core::domain::calculation::{NewSizeCalculation, SizeCalculationId};

    use super::SqlSizeCalculationRepository;
    use crate::migrations::run_pending;
    use crate::repositories::SizeCalculationRepository;
    use crate::{connect_with_settings, DbPool};

    async fn setup() -> DbPool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        run_pending(&pool).await.expect("migrations");
        pool
    }

    fn submission(last_type: &str, foot_length: f64) -> NewSizeCalculation {
        NewSizeCalculation {
            last_type: last_type.to_string(),
            foot_length,
            ball_girth: 247.5,
            recommended_size: "9.5".to_string(),
            recommended_width: "EE".to_string(),
            timestamp: "2024-05-01T12:30:00.000Z".to_string(),
        }
    }

    #[tokio::test]
    async fn create_assigns_sequential_ids_from_one() {
        let repo = SqlSizeCalculationRepository::new(setup().await);

        let first =
            repo.create_size_calculation(submission("alhambra", 263.0)).await.expect("create");
        let second =
            repo.create_size_calculation(submission("prado", 266.5)).await.expect("create");

        assert_eq!(first.id, SizeCalculationId(1));
        assert_eq!(second.id, SizeCalculationId(2));
    }

    #[tokio::test]
    async fn listing_round_trips_every_field() {
        let repo = SqlSizeCalculationRepository::new(setup().await);
        let created =
            repo.create_size_calculation(submission("santiago", 271.25)).await.expect("create");

        let listed = repo.size_calculations().await.expect("list");

        assert_eq!(listed, vec![created]);
        assert_eq!(listed[0].foot_length, 271.25);
        assert_eq!(listed[0].recommended_width, "EE");
    }

    #[tokio::test]
    async fn ids_are_not_reused_after_delete() {
        let pool = setup().await;
        let repo = SqlSizeCalculationRepository::new(pool.clone());
        repo.create_size_calculation(submission("cadiz", 260.0)).await.expect("create");
        repo.create_size_calculation(submission("cadiz", 263.0)).await.expect("create");

        sqlx::query("DELETE FROM size_calculations WHERE id = 2")
            .execute(&pool)
            .await
            .expect("delete");
        let third = repo.create_size_calculation(submission("cadiz", 266.0)).await.expect("create");

        assert_eq!(third.id, SizeCalculationId(3));
        let ids = repo
            .size_calculations()
            .await
            .expect("list")
            .into_iter()
            .map(|calculation| calculation.id.0)
            .collect::<Vec<_>>();
        assert_eq!(ids, vec![1, 3]);
    }
}
