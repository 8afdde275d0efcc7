use std::sync::Arc;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::classifier::Classifier;
use crate::config::Config;
use crate::notify::Notifier;

pub type DbPool = Pool<SqliteConnectionManager>;

#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub config: Config,
    pub classifier: Arc<Classifier>,
    pub notifier: Arc<dyn Notifier>,
}
