use std::sync::Arc;

use crate::auth::JwtService;
use crate::carts::CartEngine;
use crate::core::Config;
use crate::db::DbService;
use crate::utils::AppResult;

/// Server state shared by every handler
///
/// | Field | Description |
/// |-------|-------------|
/// | config | immutable configuration |
/// | db | SQLite pool and migrations |
/// | engine | cart business rules |
/// | jwt_service | token validation |
///
/// Cloning is shallow; the pool and JWT keys are shared.
#[derive(Clone)]
pub struct ServerState {
    pub config: Config,
    pub db: DbService,
    pub engine: CartEngine,
    pub jwt_service: Arc<JwtService>,
}

impl ServerState {
    pub fn new(config: Config, db: DbService) -> Self {
        let jwt_service = Arc::new(JwtService::with_config(config.jwt.clone()));
        let engine = CartEngine::new(db.clone());
        Self {
            config,
            db,
            engine,
            jwt_service,
        }
    }

    /// Load configuration from the environment and open the store
    pub async fn initialize() -> AppResult<Self> {
        Self::with_config(Config::from_env()).await
    }

    /// Open the store described by an explicit configuration
    pub async fn with_config(config: Config) -> AppResult<Self> {
        let db = DbService::new(&config.database_path).await?;
        Ok(Self::new(config, db))
    }
}
