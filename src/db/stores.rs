use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

use crate::db::{
    DbError, InMemoryStore, ReadingRepository, ReadingStore, TankerRepository, TankerStore,
    VillageRepository, VillageStore,
};

/// Handle over the three entity stores
///
/// Opened once at startup and passed to the services that need it. Cloning
/// is cheap and shares the underlying backend.
#[derive(Clone)]
pub struct Stores {
    pub villages: Arc<dyn VillageStore>,
    pub readings: Arc<dyn ReadingStore>,
    pub tankers: Arc<dyn TankerStore>,
    pool: Option<PgPool>,
}

impl Stores {
    /// Connect to Postgres and run pending migrations
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, DbError> {
        info!("Connecting to database...");
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        info!("Database connection established");

        info!("Running database migrations...");
        sqlx::migrate!("./migrations").run(&pool).await?;
        info!("Database migrations completed");

        Ok(Self::postgres(pool))
    }

    /// Wrap an existing pool without running migrations
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            villages: Arc::new(VillageRepository::new(pool.clone())),
            readings: Arc::new(ReadingRepository::new(pool.clone())),
            tankers: Arc::new(TankerRepository::new(pool.clone())),
            pool: Some(pool),
        }
    }

    pub fn in_memory() -> Self {
        let store = InMemoryStore::new();
        Self {
            villages: Arc::new(store.clone()),
            readings: Arc::new(store.clone()),
            tankers: Arc::new(store),
            pool: None,
        }
    }

    pub fn is_persistent(&self) -> bool {
        self.pool.is_some()
    }

    /// Close the backend. Later store calls on a Postgres handle will fail.
    pub async fn close(&self) {
        if let Some(pool) = &self.pool {
            info!("Closing database connection pool");
            pool.close().await;
        }
    }
}
