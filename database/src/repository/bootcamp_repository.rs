use std::sync::Arc;

use sqlx::{Pool, Sqlite};

use crate::{database_error::DatabaseError, helper::AddBootcampParams, models::Bootcamp};

#[derive(Debug)]
pub struct BootcampRepository {
    pool: Arc<Pool<Sqlite>>,
}

impl BootcampRepository {
    pub fn new(pool: Arc<Pool<Sqlite>>) -> Self {
        Self { pool }
    }

    pub async fn add_bootcamp(&self, params: AddBootcampParams<'_>) -> Result<i64, DatabaseError> {
        if params.name.trim().is_empty() {
            return Err(DatabaseError::ValidationError(
                "Bootcamp name cannot be empty".to_string(),
            ));
        }

        let mut transaction = self.pool.begin().await?;

        let result = sqlx::query(
            "INSERT INTO bootcamp (
                name,
                description
             ) VALUES (?, ?)",
        )
        .bind(params.name)
        .bind(params.description)
        .execute(&mut *transaction)
        .await?;
        let bootcamp_id = result.last_insert_rowid();

        for capability_id in params.capability_ids.iter().copied() {
            sqlx::query(
                "INSERT OR IGNORE INTO bootcamp_capability (
                    bootcamp_id,
                    capability_id
                 ) VALUES (?, ?)",
            )
            .bind(bootcamp_id)
            .bind(capability_id)
            .execute(&mut *transaction)
            .await?;
        }

        transaction.commit().await?;

        Ok(bootcamp_id)
    }

    pub async fn get_bootcamp(&self, id: i64) -> Result<Option<Bootcamp>, DatabaseError> {
        let bootcamp = sqlx::query_as::<_, Bootcamp>(
            "SELECT id, name, description
             FROM bootcamp
             WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&*self.pool)
        .await?;
        Ok(bootcamp)
    }

    pub async fn get_capability_ids_for_bootcamp(
        &self,
        bootcamp_id: i64,
    ) -> Result<Vec<i64>, DatabaseError> {
        let capability_ids = sqlx::query_scalar::<_, i64>(
            "SELECT capability_id
             FROM bootcamp_capability
             WHERE bootcamp_id = ?
             ORDER BY capability_id",
        )
        .bind(bootcamp_id)
        .fetch_all(&*self.pool)
        .await?;
        Ok(capability_ids)
    }

    /// Number of bootcamps other than `excluding_bootcamp_id` linking to the capability.
    pub async fn count_other_bootcamps_for_capability(
        &self,
        capability_id: i64,
        excluding_bootcamp_id: i64,
    ) -> Result<i64, DatabaseError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*)
             FROM bootcamp_capability
             WHERE capability_id = ?
             AND bootcamp_id <> ?",
        )
        .bind(capability_id)
        .bind(excluding_bootcamp_id)
        .fetch_one(&*self.pool)
        .await?;
        Ok(count)
    }

    pub async fn count_links_for_bootcamp(&self, bootcamp_id: i64) -> Result<i64, DatabaseError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*)
             FROM bootcamp_capability
             WHERE bootcamp_id = ?",
        )
        .bind(bootcamp_id)
        .fetch_one(&*self.pool)
        .await?;
        Ok(count)
    }

    /// Deletes the bootcamp together with its capability links and enrollments in one
    /// transaction. Nothing is committed when the bootcamp row does not exist.
    pub async fn delete_bootcamp(&self, id: i64) -> Result<i64, DatabaseError> {
        let mut transaction = self.pool.begin().await?;

        sqlx::query("DELETE FROM bootcamp_capability WHERE bootcamp_id = ?")
            .bind(id)
            .execute(&mut *transaction)
            .await?;

        sqlx::query("DELETE FROM bootcamp_enrollment WHERE bootcamp_id = ?")
            .bind(id)
            .execute(&mut *transaction)
            .await?;

        let result = sqlx::query("DELETE FROM bootcamp WHERE id = ?")
            .bind(id)
            .execute(&mut *transaction)
            .await?;

        if result.rows_affected() == 0 {
            transaction.rollback().await?;
            return Err(DatabaseError::BootcampNotFound(id));
        }

        transaction.commit().await?;
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use crate::setup_test_db;

    use super::*;

    async fn insert_test_bootcamp(
        repository: &BootcampRepository,
        name: &str,
        capability_ids: &[i64],
    ) -> i64 {
        repository
            .add_bootcamp(AddBootcampParams {
                name,
                description: "test bootcamp",
                capability_ids,
            })
            .await
            .unwrap()
    }

    #[async_std::test]
    async fn test_add_bootcamp() {
        let pool = Arc::new(setup_test_db().await);
        let repository = BootcampRepository::new(pool);

        let bootcamp_id = insert_test_bootcamp(&repository, "rust", &[1, 2]).await;

        let bootcamp = repository.get_bootcamp(bootcamp_id).await.unwrap().unwrap();
        assert_eq!(bootcamp.name, "rust");
        assert_eq!(
            repository
                .get_capability_ids_for_bootcamp(bootcamp_id)
                .await
                .unwrap(),
            vec![1, 2]
        );
    }

    #[async_std::test]
    async fn test_add_bootcamp_rejects_empty_name() {
        let pool = Arc::new(setup_test_db().await);
        let repository = BootcampRepository::new(pool);

        let result = repository
            .add_bootcamp(AddBootcampParams {
                name: "  ",
                description: "",
                capability_ids: &[],
            })
            .await;

        assert_eq!(
            result,
            Err(DatabaseError::ValidationError(String::new()))
        );
    }

    #[async_std::test]
    async fn test_get_capability_ids_for_unknown_bootcamp_is_empty() {
        let pool = Arc::new(setup_test_db().await);
        let repository = BootcampRepository::new(pool);

        let ids = repository.get_capability_ids_for_bootcamp(42).await.unwrap();
        assert!(ids.is_empty());
    }

    #[async_std::test]
    async fn test_count_other_bootcamps_for_capability() {
        let pool = Arc::new(setup_test_db().await);
        let repository = BootcampRepository::new(pool);

        let first = insert_test_bootcamp(&repository, "first", &[10, 11]).await;
        let second = insert_test_bootcamp(&repository, "second", &[10]).await;

        assert_eq!(
            repository
                .count_other_bootcamps_for_capability(10, first)
                .await
                .unwrap(),
            1
        );
        assert_eq!(
            repository
                .count_other_bootcamps_for_capability(10, second)
                .await
                .unwrap(),
            1
        );
        assert_eq!(
            repository
                .count_other_bootcamps_for_capability(11, first)
                .await
                .unwrap(),
            0
        );
    }

    #[async_std::test]
    async fn test_delete_bootcamp_removes_links_and_enrollments() {
        let pool = Arc::new(setup_test_db().await);
        let repository = BootcampRepository::new(pool.clone());

        let bootcamp_id = insert_test_bootcamp(&repository, "rust", &[1, 2, 3]).await;
        sqlx::query("INSERT INTO bootcamp_enrollment (bootcamp_id, person_id) VALUES (?, ?)")
            .bind(bootcamp_id)
            .bind(100)
            .execute(&*pool)
            .await
            .unwrap();

        let deleted_id = repository.delete_bootcamp(bootcamp_id).await.unwrap();

        assert_eq!(deleted_id, bootcamp_id);
        assert!(repository.get_bootcamp(bootcamp_id).await.unwrap().is_none());
        assert_eq!(
            repository.count_links_for_bootcamp(bootcamp_id).await.unwrap(),
            0
        );
        let enrollments = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM bootcamp_enrollment WHERE bootcamp_id = ?",
        )
        .bind(bootcamp_id)
        .fetch_one(&*pool)
        .await
        .unwrap();
        assert_eq!(enrollments, 0);
    }

    #[async_std::test]
    async fn test_delete_bootcamp_keeps_links_of_other_bootcamps() {
        let pool = Arc::new(setup_test_db().await);
        let repository = BootcampRepository::new(pool);

        let first = insert_test_bootcamp(&repository, "first", &[1]).await;
        let second = insert_test_bootcamp(&repository, "second", &[1]).await;

        repository.delete_bootcamp(first).await.unwrap();

        assert_eq!(
            repository.get_capability_ids_for_bootcamp(second).await.unwrap(),
            vec![1]
        );
    }

    #[async_std::test]
    async fn test_delete_missing_bootcamp_returns_not_found() {
        let pool = Arc::new(setup_test_db().await);
        let repository = BootcampRepository::new(pool.clone());

        // orphan link rows of a missing bootcamp are not touched by a failed delete
        sqlx::query("PRAGMA foreign_keys = OFF")
            .execute(&*pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO bootcamp_capability (bootcamp_id, capability_id) VALUES (?, ?)")
            .bind(99)
            .bind(1)
            .execute(&*pool)
            .await
            .unwrap();

        let result = repository.delete_bootcamp(99).await;

        assert_eq!(result, Err(DatabaseError::BootcampNotFound(99)));
        assert_eq!(repository.count_links_for_bootcamp(99).await.unwrap(), 1);
    }
}
