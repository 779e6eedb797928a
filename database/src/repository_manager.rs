use std::sync::Arc;

use sqlx::{Pool, Sqlite};

use crate::repository::{
    bootcamp_repository::BootcampRepository, enrollment_repository::EnrollmentRepository,
};

#[derive(Debug)]
pub struct RepositoryManager {
    bootcamp_repository: BootcampRepository,
    enrollment_repository: EnrollmentRepository,
}

impl RepositoryManager {
    pub fn new(pool: Arc<Pool<Sqlite>>) -> Self {
        let bootcamp_repository = BootcampRepository::new(pool.clone());
        let enrollment_repository = EnrollmentRepository::new(pool);

        Self {
            bootcamp_repository,
            enrollment_repository,
        }
    }

    pub fn get_bootcamp_repository(&self) -> &BootcampRepository {
        &self.bootcamp_repository
    }

    pub fn get_enrollment_repository(&self) -> &EnrollmentRepository {
        &self.enrollment_repository
    }
}
