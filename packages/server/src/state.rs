use std::sync::Arc;

use crate::config::AppConfig;
use crate::files::FileService;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub files: FileService,
}
