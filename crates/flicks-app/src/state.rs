use std::sync::Arc;

use flicks_dal::movie::MovieStore;

#[derive(Clone)]
pub struct AppState {
    state: Arc<AppStateInner>,
}

impl AppState {
    pub fn new(app_config: AppConfig, movies: Arc<dyn MovieStore>) -> Self {
        AppState {
            state: Arc::new(AppStateInner { app_config, movies }),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.state.app_config
    }

    pub fn movies(&self) -> Arc<dyn MovieStore> {
        self.state.movies.clone()
    }
}

struct AppStateInner {
    app_config: AppConfig,
    movies: Arc<dyn MovieStore>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: String,
    pub version: String,
    pub default_page_size: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            default_page_size: 20,
        }
    }
}
