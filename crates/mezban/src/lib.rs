pub mod application;
pub mod category;
pub mod config;
pub mod db;
pub mod error;
pub mod upload;

pub use application::{
    ApplicationError, ApplicationStatus, ApplicationWorkflow, ChefApplication, FileDescriptor,
    NewApplication,
};
pub use category::{Category, CategoryCheck};
pub use config::{load_config, Config};
pub use error::{ConfigError, MezbanError, Result, StorageError};
pub use upload::UploadStorage;
