use std::sync::Arc;

use sqlx::{Pool, Sqlite};

use crate::database_error::DatabaseError;

#[derive(Debug)]
pub struct EnrollmentRepository {
    pool: Arc<Pool<Sqlite>>,
}

impl EnrollmentRepository {
    pub fn new(pool: Arc<Pool<Sqlite>>) -> Self {
        Self { pool }
    }

    pub async fn add_enrollment(&self, bootcamp_id: i64, person_id: i64) -> Result<(), DatabaseError> {
        sqlx::query(
            "INSERT OR IGNORE INTO bootcamp_enrollment (
                bootcamp_id,
                person_id
             ) VALUES (?, ?)",
        )
        .bind(bootcamp_id)
        .bind(person_id)
        .execute(&*self.pool)
        .await?;
        Ok(())
    }

    pub async fn count_enrollments_for_bootcamp(
        &self,
        bootcamp_id: i64,
    ) -> Result<i64, DatabaseError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*)
             FROM bootcamp_enrollment
             WHERE bootcamp_id = ?",
        )
        .bind(bootcamp_id)
        .fetch_one(&*self.pool)
        .await?;
        Ok(count)
    }
}
