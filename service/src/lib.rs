pub mod app_services;
pub mod bootcamp_deletion;
pub mod bootcamp_metrics_service;
pub mod error;
pub mod pipeline;
pub mod relationship_store;
pub mod settings;
