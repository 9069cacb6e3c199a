#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("Database error: {0}")]
    SqlxError(#[from] sqlx::Error),
    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),
    #[error("License plate already registered: {0}")]
    DuplicateLicensePlate(String),
}
