use std::sync::Arc;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::config::Config;
use crate::market::{MarketRepository, SqliteMarketRepository};

pub type DbPool = Pool<SqliteConnectionManager>;

#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub config: Config,
    pub market: Arc<dyn MarketRepository>,
}

impl AppState {
    pub fn new(db: DbPool, config: Config) -> Self {
        let market = Arc::new(SqliteMarketRepository::new(db.clone()));
        Self { db, config, market }
    }
}
