use std::sync::Arc;

use crate::config::AppConfig;
use crate::core::notifications::{self, NotificationChannel};
use crate::core::{GlacierClient, ProgressReporter};
use tokio_rusqlite::Connection;

#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<AppConfig>,
    pub db: Connection,
    pub client: Arc<dyn GlacierClient>,
    pub reporter: Arc<dyn ProgressReporter>,
    pub notifier: Option<Arc<dyn NotificationChannel>>,
}

impl AppContext {
    pub fn new(
        config: AppConfig,
        db: Connection,
        client: Arc<dyn GlacierClient>,
        reporter: Arc<dyn ProgressReporter>,
    ) -> Self {
        let notifier = notifications::create_notifier(&config.notifications);
        Self {
            config: Arc::new(config),
            db,
            client,
            reporter,
            notifier,
        }
    }
}
