pub mod bootcamp_repository;
pub mod enrollment_repository;
