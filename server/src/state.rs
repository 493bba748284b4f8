use std::sync::Arc;

use mezban::db::{self, Database};
use mezban::{ApplicationWorkflow, Config, ConfigError, MezbanError, UploadStorage};

pub struct AppState {
    pub config: Config,
    pub workflow: ApplicationWorkflow,
    pub uploads: UploadStorage,
}

impl AppState {
    pub fn new(config: Config) -> Result<Arc<Self>, MezbanError> {
        let database_path = config
            .database_path
            .clone()
            .or_else(db::default_database_path)
            .ok_or_else(|| {
                MezbanError::Config(ConfigError::Validation {
                    message: "no databasePath configured and no home directory".to_string(),
                })
            })?;

        let database = Database::open(&database_path)?;
        let workflow = ApplicationWorkflow::new(database);
        let uploads = UploadStorage::new(&config.upload_dir);

        Ok(Arc::new(Self {
            config,
            workflow,
            uploads,
        }))
    }
}
