use std::sync::Arc;

use crate::config::AppConfig;
use crate::kv::KvStore;

#[derive(Clone)]
pub struct AppState {
    pub kv: Arc<dyn KvStore>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(kv: Arc<dyn KvStore>, config: AppConfig) -> Self {
        Self {
            kv,
            config: Arc::new(config),
        }
    }
}
