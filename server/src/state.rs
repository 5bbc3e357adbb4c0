use std::sync::Arc;

use doodle_shared::GameConfig;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GameConfig>,
}

impl AppState {
    pub fn new(config: GameConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }
}
