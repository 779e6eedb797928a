use sqlx::Error as SqlxError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Database error: {0}")]
    SqlxError(#[from] SqlxError),

    #[error("Bootcamp with id {0} not found")]
    BootcampNotFound(i64),
    #[error("Database error: {0}")]
    DbError(String),
    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl PartialEq for DatabaseError {
    fn eq(&self, other: &Self) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}
