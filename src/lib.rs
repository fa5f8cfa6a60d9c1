pub mod api;
pub mod config;
pub mod db;

use config::Config;
use db::Db;

pub struct AppState {
    pub config: Config,
    pub db: Db,
}

impl AppState {
    pub fn new(config: Config, db: Db) -> Self {
        Self { config, db }
    }
}
