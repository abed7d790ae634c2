use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;

use crate::auth::Auth;
use crate::config::AppConfig;
use crate::db::Db;

#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub auth: Auth,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.database_url)
            .await
            .context("connect to database")?;
        Ok(Self::from_pool(pool, config))
    }

    pub fn from_pool(pool: sqlx::PgPool, config: Arc<AppConfig>) -> Self {
        let db = Db::new(pool);
        let auth = Auth::new(db.clone());
        Self { db, auth, config }
    }
}
