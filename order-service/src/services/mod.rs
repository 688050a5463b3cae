pub mod database;
pub mod files;
pub mod metrics;
pub mod reports;

pub use database::Database;
pub use files::DesignFileStore;
