use std::{fs, path::PathBuf};

use directories_next::ProjectDirs;

use crate::database_error::DatabaseError;

/// Returns the database URL in the format sqlite:///absolute/path/to/bootcamp.sqlite
pub fn default_database_url() -> Result<String, DatabaseError> {
    let db_path = get_database_path()?;
    Ok(format!("sqlite://{}", db_path.display()))
}

/// Returns path to database file located in default data dir for application.
pub fn get_database_path() -> Result<PathBuf, DatabaseError> {
    Ok(get_default_data_dir()?.join("bootcamp.sqlite"))
}

pub fn get_default_data_dir() -> Result<PathBuf, DatabaseError> {
    let project_dirs = ProjectDirs::from("org", "bootcamp", "bootcamp-admin").ok_or_else(|| {
        DatabaseError::DbError("Could not determine project directory".to_string())
    })?;
    let data_dir = project_dirs.data_local_dir();
    fs::create_dir_all(data_dir).map_err(|e| {
        DatabaseError::DbError(format!(
            "Failed to create app data directory {}: {}",
            data_dir.display(),
            e
        ))
    })?;
    Ok(PathBuf::from(data_dir))
}
